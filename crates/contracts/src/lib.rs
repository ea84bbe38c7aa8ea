//! Общие DTO и агрегаты: строки заказов Uzum, локальный каталог,
//! синхронизация и дашборд юнит-экономики.

pub mod dashboards;
pub mod domain;
pub mod enums;
pub mod shared;
pub mod usecases;
