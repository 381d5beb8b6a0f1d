pub mod condition_service;
pub mod contract_service;
pub mod loan_workflow;
