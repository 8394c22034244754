use blockscout_service_launcher::test_database::TestDbGuard;

pub mod mock_db;

pub async fn init_db(name: &str) -> TestDbGuard {
    TestDbGuard::new::<evm_indexer_migration::Migrator>(name).await
}