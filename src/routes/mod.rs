pub mod loan_routes;
pub mod vehicle_routes;
