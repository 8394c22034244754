use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        crate::from_sql(
            manager,
            r#"
            CREATE TYPE transaction_status AS ENUM ('pending', 'success', 'failed');
            CREATE TYPE transaction_type AS ENUM ('legacy', 'access_list', 'dynamic_fee');
            CREATE TYPE account_type AS ENUM ('eoa', 'smart_account');
            CREATE TYPE verification_status AS ENUM ('unverified', 'verified', 'partially_verified');

            CREATE TABLE blocks (
                hash TEXT PRIMARY KEY,
                number BIGINT NOT NULL UNIQUE,
                parent_hash TEXT NOT NULL,
                timestamp BIGINT NOT NULL,
                proposer TEXT,
                gas_limit BIGINT NOT NULL,
                gas_used BIGINT NOT NULL,
                base_fee_per_gas TEXT,
                transaction_count INT NOT NULL,
                size BIGINT,
                extra_data TEXT,
                state_root TEXT,
                receipts_root TEXT,
                transactions_root TEXT,
                nonce TEXT,
                mix_hash TEXT,
                removed BOOLEAN NOT NULL DEFAULT FALSE,
                inserted_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            );

            CREATE TABLE transactions (
                hash TEXT PRIMARY KEY,
                block_hash TEXT NOT NULL REFERENCES blocks (hash),
                block_number BIGINT NOT NULL,
                transaction_index INT NOT NULL,
                from_address TEXT NOT NULL,
                to_address TEXT,
                value TEXT NOT NULL,
                gas_limit BIGINT NOT NULL,
                gas_used BIGINT,
                gas_price TEXT,
                max_fee_per_gas TEXT,
                max_priority_fee_per_gas TEXT,
                nonce BIGINT NOT NULL,
                input TEXT NOT NULL,
                transaction_type transaction_type NOT NULL,
                status transaction_status NOT NULL,
                contract_address TEXT,
                logs_bloom TEXT,
                method_type TEXT,
                method_name TEXT,
                mined_at TIMESTAMPTZ,
                removed BOOLEAN NOT NULL DEFAULT FALSE,
                inserted_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            );
            CREATE UNIQUE INDEX idx_transactions_block_hash_index
                ON transactions (block_hash, transaction_index);

            CREATE TABLE events (
                id TEXT PRIMARY KEY,
                contract_address TEXT NOT NULL,
                tx_hash TEXT NOT NULL,
                block_number BIGINT NOT NULL,
                block_hash TEXT NOT NULL REFERENCES blocks (hash),
                log_index INT NOT NULL,
                transaction_index INT NOT NULL,
                topics TEXT[] NOT NULL,
                data TEXT NOT NULL,
                decoded_data JSONB,
                event_name TEXT,
                event_signature TEXT,
                removed BOOLEAN NOT NULL DEFAULT FALSE,
                timestamp TIMESTAMPTZ,
                inserted_at TIMESTAMPTZ NOT NULL DEFAULT now()
            );
            CREATE UNIQUE INDEX idx_events_block_hash_log_index
                ON events (block_hash, log_index);
            CREATE INDEX idx_events_contract_address ON events (contract_address);

            CREATE TABLE accounts (
                address TEXT PRIMARY KEY,
                account_type account_type NOT NULL,
                balance TEXT,
                nonce BIGINT,
                transaction_count BIGINT NOT NULL DEFAULT 0,
                contract_interactions_count BIGINT NOT NULL DEFAULT 0,
                first_seen TIMESTAMPTZ NOT NULL DEFAULT now(),
                last_activity TIMESTAMPTZ NOT NULL DEFAULT now(),
                is_contract BOOLEAN NOT NULL DEFAULT FALSE,
                contract_type TEXT,
                factory TEXT,
                implementation TEXT,
                owner TEXT,
                label TEXT,
                risk_score DOUBLE PRECISION,
                compliance_status TEXT,
                inserted_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            );

            CREATE TABLE smart_contracts (
                address TEXT PRIMARY KEY,
                name TEXT,
                symbol TEXT,
                contract_type TEXT,
                creator_address TEXT,
                creation_tx_hash TEXT,
                creation_block BIGINT,
                verification_status verification_status NOT NULL DEFAULT 'unverified',
                abi JSONB,
                bytecode TEXT,
                total_transactions BIGINT NOT NULL DEFAULT 0,
                unique_interactors BIGINT NOT NULL DEFAULT 0,
                total_gas_used TEXT NOT NULL DEFAULT '0',
                total_value_transferred TEXT NOT NULL DEFAULT '0',
                total_events BIGINT NOT NULL DEFAULT 0,
                is_proxy BOOLEAN NOT NULL DEFAULT FALSE,
                implementation_address TEXT,
                inserted_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            );

            CREATE TABLE validators (
                address TEXT PRIMARY KEY,
                blocks_proposed BIGINT NOT NULL DEFAULT 0,
                last_proposed_block BIGINT,
                active BOOLEAN NOT NULL DEFAULT FALSE,
                uptime_score DOUBLE PRECISION,
                inserted_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            );

            CREATE TABLE indexer_checkpoints (
                component TEXT PRIMARY KEY,
                cursor_block_number BIGINT NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            );

            CREATE TABLE processed_transaction_hashes (
                tx_hash TEXT PRIMARY KEY,
                processed_at TIMESTAMPTZ NOT NULL DEFAULT now()
            );
            "#,
        )
        .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        crate::from_sql(
            manager,
            r#"
            DROP TABLE IF EXISTS processed_transaction_hashes;
            DROP TABLE IF EXISTS indexer_checkpoints;
            DROP TABLE IF EXISTS validators;
            DROP TABLE IF EXISTS smart_contracts;
            DROP TABLE IF EXISTS accounts;
            DROP TABLE IF EXISTS events;
            DROP TABLE IF EXISTS transactions;
            DROP TABLE IF EXISTS blocks;
            DROP TYPE IF EXISTS verification_status;
            DROP TYPE IF EXISTS account_type;
            DROP TYPE IF EXISTS transaction_type;
            DROP TYPE IF EXISTS transaction_status;
            "#,
        )
        .await
    }
}
