//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Methods that take part in a
//! larger transaction accept `&mut PgConnection` and end in `_in`.

pub mod backlog_repo;
pub mod dashboard_repo;
pub mod equipment_repo;
pub mod equipment_type_repo;
pub mod item_group_repo;
pub mod item_repo;
pub mod maintenance_type_repo;
pub mod mechanic_repo;
pub mod oil_analysis_repo;
pub mod part_repo;
pub mod preventive_plan_repo;
pub mod stock_location_repo;
pub mod stock_movement_repo;
pub mod tire_repo;
pub mod user_repo;
pub mod work_order_repo;

pub use backlog_repo::{BacklogGrouping, BacklogOrder, BacklogRepo};
pub use dashboard_repo::DashboardRepo;
pub use equipment_repo::EquipmentRepo;
pub use equipment_type_repo::EquipmentTypeRepo;
pub use item_group_repo::ItemGroupRepo;
pub use item_repo::ItemRepo;
pub use maintenance_type_repo::MaintenanceTypeRepo;
pub use mechanic_repo::MechanicRepo;
pub use oil_analysis_repo::OilAnalysisRepo;
pub use part_repo::PartRepo;
pub use preventive_plan_repo::PreventivePlanRepo;
pub use stock_location_repo::StockLocationRepo;
pub use stock_movement_repo::StockMovementRepo;
pub use tire_repo::TireRepo;
pub use user_repo::UserRepo;
pub use work_order_repo::WorkOrderRepo;
