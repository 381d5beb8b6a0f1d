pub mod client_repository;
pub mod company_repository;
pub mod loan_repository;
pub mod memory;
pub mod vehicle_repository;

pub use client_repository::{ClientRepository, PgClientRepository};
pub use company_repository::{CompanyRepository, PgCompanyRepository};
pub use loan_repository::{LoanRepository, PgLoanRepository};
pub use memory::MemoryStore;
pub use vehicle_repository::{PgVehicleRepository, VehicleRepository};
