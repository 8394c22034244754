use chrono::Utc;
use evm_indexer_entity::sea_orm_active_enums::{TransactionStatus, TransactionType};
use evm_indexer_entity::{blocks, transactions};
use sea_orm::{ActiveValue::Set, DatabaseConnection, EntityTrait};

/// Seeds a small, self-consistent block/transaction fixture for store-layer
/// and handler tests.
pub async fn fill_mock_indexer_database(db: &DatabaseConnection) {
    let now = Utc::now();

    blocks::Entity::insert(blocks::ActiveModel {
        hash: Set("0xblock0000000000000000000000000000000000000000000000000000001".to_owned()),
        number: Set(1),
        parent_hash: Set("0x0".to_owned()),
        timestamp: Set(now.timestamp()),
        proposer: Set(Some("0xvalidator00000000000000000000000000001".to_owned())),
        gas_limit: Set(30_000_000),
        gas_used: Set(21_000),
        base_fee_per_gas: Set(Some("1000000000".to_owned())),
        transaction_count: Set(1),
        size: Set(Some(512)),
        extra_data: Set(None),
        state_root: Set(None),
        receipts_root: Set(None),
        transactions_root: Set(None),
        nonce: Set(None),
        mix_hash: Set(None),
        removed: Set(false),
        inserted_at: Set(now),
        updated_at: Set(now),
    })
    .exec(db)
    .await
    .unwrap();

    transactions::Entity::insert(transactions::ActiveModel {
        hash: Set("0xtx00000000000000000000000000000000000000000000000000000001".to_owned()),
        block_hash: Set("0xblock0000000000000000000000000000000000000000000000000000001".to_owned()),
        block_number: Set(1),
        transaction_index: Set(0),
        from_address: Set("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".to_owned()),
        to_address: Set(Some("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb".to_owned())),
        value: Set("1000000000000000000".to_owned()),
        gas_limit: Set(21_000),
        gas_used: Set(Some(21_000)),
        gas_price: Set(Some("1000000000".to_owned())),
        max_fee_per_gas: Set(None),
        max_priority_fee_per_gas: Set(None),
        nonce: Set(0),
        input: Set("0x".to_owned()),
        transaction_type: Set(TransactionType::Legacy),
        status: Set(TransactionStatus::Success),
        contract_address: Set(None),
        logs_bloom: Set(None),
        method_type: Set(None),
        method_name: Set(None),
        mined_at: Set(Some(now)),
        removed: Set(false),
        inserted_at: Set(now),
        updated_at: Set(now),
    })
    .exec(db)
    .await
    .unwrap();
}
