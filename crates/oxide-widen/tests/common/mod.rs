#![allow(dead_code)]

use oxide_widen::catalog::parse_create_table;
use oxide_widen::mock::{MemoryCatalog, MemoryDatabase, RecordingExecutor, RecordingSink};
use oxide_widen::schema::TableName;
use oxide_widen::transformer::Transformer;

pub const USERS: &str = "CREATE TABLE `users` (
  `id` int unsigned NOT NULL AUTO_INCREMENT,
  `email` varchar(255) NOT NULL,
  PRIMARY KEY (`id`)
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4";

pub const ORDERS: &str = "CREATE TABLE `orders` (
  `id` int unsigned NOT NULL AUTO_INCREMENT,
  `user_id` int unsigned NOT NULL,
  `quantity` int NOT NULL DEFAULT '1',
  PRIMARY KEY (`id`),
  KEY `fk_orders_user` (`user_id`),
  CONSTRAINT `fk_orders_user` FOREIGN KEY (`user_id`) REFERENCES `users` (`id`) ON DELETE CASCADE
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4";

/// Catalog holding the parsed `CREATE TABLE` statements, in order.
pub fn catalog_from(statements: &[(&str, &str)]) -> MemoryCatalog {
    statements
        .iter()
        .fold(MemoryCatalog::new(), |catalog, (name, sql)| {
            catalog.table(parse_create_table(&TableName::new(*name), sql))
        })
}

/// The users/orders schema.
pub fn shop() -> MemoryCatalog {
    catalog_from(&[("users", USERS), ("orders", ORDERS)])
}

/// A transformer plus handles on its recorders.
pub struct Harness {
    pub transformer: Transformer,
    pub executor: RecordingExecutor,
    pub sink: RecordingSink,
}

pub fn harness(catalog: MemoryCatalog, database: MemoryDatabase) -> Harness {
    harness_with(catalog, database, RecordingExecutor::new())
}

pub fn harness_with(
    catalog: MemoryCatalog,
    database: MemoryDatabase,
    executor: RecordingExecutor,
) -> Harness {
    let sink = RecordingSink::new();
    let transformer = Transformer::new(catalog, database, executor.clone(), sink.clone());
    Harness {
        transformer,
        executor,
        sink,
    }
}
