//! Tests de integración del ciclo de vida de préstamos sobre el almacén en
//! memoria: apertura, cierre, firmas, contrato y las invariantes cruzadas
//! entre préstamo y vehículo.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use courtesy_fleet::controllers::{LoanController, VehicleController};
use courtesy_fleet::dto::condition_dto::ConditionReportInput;
use courtesy_fleet::dto::loan_dto::{AttachSignaturesRequest, CloseLoanRequest};
use courtesy_fleet::dto::vehicle_dto::{CreateVehicleRequest, UpdateVehicleStatusRequest};
use courtesy_fleet::models::client::Client;
use courtesy_fleet::models::company::CompanyProfile;
use courtesy_fleet::models::condition_report::{
    CleanlinessLevel, LightsCondition, TireCondition,
};
use courtesy_fleet::models::loan_vehicle::VehicleStatus;
use courtesy_fleet::repositories::{
    ClientRepository, CompanyRepository, LoanRepository, MemoryStore, VehicleRepository,
};
use courtesy_fleet::services::loan_workflow::LoanDraft;
use courtesy_fleet::storage::MemoryObjectStorage;
use courtesy_fleet::utils::errors::AppError;

struct TestBed {
    store: Arc<MemoryStore>,
    vehicles: VehicleController,
    loans: LoanController,
    company_id: Uuid,
    client_id: Uuid,
}

async fn testbed() -> TestBed {
    let store = Arc::new(MemoryStore::new());
    let storage = Arc::new(MemoryObjectStorage::new());

    let company_id = Uuid::new_v4();
    CompanyRepository::create(
        &*store,
        CompanyProfile {
            id: company_id,
            name: "Garage Central".to_string(),
            address: "12 rue de la Paix, 69002 Lyon".to_string(),
            siret: Some("123 456 789 00012".to_string()),
            phone: Some("+33 4 72 00 00 00".to_string()),
            email: Some("contact@garage-central.fr".to_string()),
            logo_url: None,
            created_at: Utc::now(),
        },
    )
    .await
    .unwrap();

    let client_id = Uuid::new_v4();
    ClientRepository::create(
        &*store,
        Client {
            id: client_id,
            company_id,
            first_name: "Marie".to_string(),
            last_name: "Lefort".to_string(),
            address: Some("8 avenue Berthelot, Lyon".to_string()),
            phone: Some("+33 6 11 22 33 44".to_string()),
            email: Some("marie.lefort@example.fr".to_string()),
            created_at: Utc::now(),
        },
    )
    .await
    .unwrap();

    let vehicles_repo: Arc<dyn VehicleRepository> = store.clone();
    let loans_repo: Arc<dyn LoanRepository> = store.clone();
    let clients_repo: Arc<dyn ClientRepository> = store.clone();
    let companies_repo: Arc<dyn CompanyRepository> = store.clone();

    let vehicles = VehicleController::new(vehicles_repo.clone(), loans_repo.clone());
    let loans = LoanController::new(
        loans_repo,
        vehicles_repo,
        clients_repo,
        companies_repo,
        storage,
        Duration::from_secs(5),
    );

    TestBed {
        store,
        vehicles,
        loans,
        company_id,
        client_id,
    }
}

fn vehicle_request(plate: &str) -> CreateVehicleRequest {
    CreateVehicleRequest {
        make: "Renault".to_string(),
        model: "Clio".to_string(),
        registration_number: plate.to_string(),
        chassis_number: None,
        engine_number: None,
        color: Some("Gris".to_string()),
        mileage: 10000,
        fuel_level: 50,
        photos: vec![],
        damages: vec![],
        notes: None,
    }
}

fn opening_report() -> ConditionReportInput {
    ConditionReportInput {
        mileage: 10000,
        fuel_level: 50,
        exterior_state: CleanlinessLevel::Clean,
        interior_state: CleanlinessLevel::Normal,
        tires: TireCondition::Good,
        lights: LightsCondition::Working,
        damages: vec![],
        photos: vec![],
    }
}

fn complete_draft(vehicle_id: Uuid, client_id: Uuid) -> LoanDraft {
    LoanDraft {
        vehicle_id: Some(vehicle_id),
        client_id: Some(client_id),
        start_date: NaiveDate::from_ymd_opt(2024, 3, 1),
        expected_end_date: NaiveDate::from_ymd_opt(2024, 3, 15),
        start_mileage: Some(10000),
        start_fuel_level: Some(50),
        opening_report: Some(opening_report()),
        driver_name: Some("Marie Lefort".to_string()),
        license_number: Some("13AA00002".to_string()),
        license_issue_date: NaiveDate::from_ymd_opt(2015, 5, 20),
        birth_date: NaiveDate::from_ymd_opt(1990, 6, 15),
        birth_place: Some("Lyon".to_string()),
        license_front_url: Some("memory://licenses/front/1.jpg".to_string()),
        license_back_url: None,
        insurer_name: Some("AXA".to_string()),
        policy_number: Some("POL-2024-001".to_string()),
        client_signature_url: Some("memory://signatures/client/1.png".to_string()),
        dealer_signature_url: Some("memory://signatures/dealer/1.png".to_string()),
        notes: None,
    }
}

fn close_request(end_mileage: i32, end_fuel_level: i32) -> CloseLoanRequest {
    CloseLoanRequest {
        end_mileage,
        end_fuel_level,
        exterior_state: CleanlinessLevel::Dirty,
        interior_state: CleanlinessLevel::Normal,
        tires: TireCondition::Good,
        lights: LightsCondition::Working,
        damages: vec![],
        photos: vec![],
        notes: None,
    }
}

#[tokio::test]
async fn test_full_lifecycle_open_then_close() {
    let bed = testbed().await;
    let vehicle = bed
        .vehicles
        .create(bed.company_id, vehicle_request("AB-123-CD"))
        .await
        .unwrap()
        .data
        .unwrap();

    let opened = bed
        .loans
        .open_loan(bed.company_id, complete_draft(vehicle.id, bed.client_id))
        .await
        .unwrap()
        .data
        .unwrap();

    assert!(opened.is_open);
    assert!(opened.contract_signed);

    // El vehículo queda prestado mientras el préstamo está abierto
    let stored = VehicleRepository::find_by_id(&*bed.store, vehicle.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, VehicleStatus::Loaned);

    let closed = bed
        .loans
        .close_loan(opened.id, bed.company_id, close_request(10350, 40))
        .await
        .unwrap()
        .data
        .unwrap();

    assert!(!closed.is_open);
    assert_eq!(closed.distance_driven, Some(350));
    assert_eq!(closed.end_fuel_level, Some(40));
    assert!(closed.closing_report.is_some());

    // El vehículo vuelve a la flota con las lecturas finales
    let stored = VehicleRepository::find_by_id(&*bed.store, vehicle.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, VehicleStatus::Available);
    assert_eq!(stored.mileage, 10350);
    assert_eq!(stored.fuel_level, 40);
}

#[tokio::test]
async fn test_open_requires_available_vehicle() {
    let bed = testbed().await;
    let vehicle = bed
        .vehicles
        .create(bed.company_id, vehicle_request("AB-123-CD"))
        .await
        .unwrap()
        .data
        .unwrap();

    bed.vehicles
        .set_status(
            vehicle.id,
            bed.company_id,
            UpdateVehicleStatusRequest {
                status: "maintenance".to_string(),
            },
        )
        .await
        .unwrap();

    let result = bed
        .loans
        .open_loan(bed.company_id, complete_draft(vehicle.id, bed.client_id))
        .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
    assert_eq!(bed.store.loan_count().await, 0);

    // El fallo no toca el estado del vehículo
    let stored = VehicleRepository::find_by_id(&*bed.store, vehicle.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, VehicleStatus::Maintenance);
}

#[tokio::test]
async fn test_concurrent_open_only_one_wins() {
    let bed = testbed().await;
    let vehicle = bed
        .vehicles
        .create(bed.company_id, vehicle_request("AB-123-CD"))
        .await
        .unwrap()
        .data
        .unwrap();

    let draft_a = complete_draft(vehicle.id, bed.client_id);
    let draft_b = complete_draft(vehicle.id, bed.client_id);

    let (first, second) = tokio::join!(
        bed.loans.open_loan(bed.company_id, draft_a),
        bed.loans.open_loan(bed.company_id, draft_b),
    );

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "solo una apertura puede ganar el vehículo");

    let loser = if first.is_ok() { second } else { first };
    assert!(matches!(loser, Err(AppError::Conflict(_))));

    assert_eq!(bed.store.loan_count().await, 1);
    let stored = VehicleRepository::find_by_id(&*bed.store, vehicle.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, VehicleStatus::Loaned);
}

#[tokio::test]
async fn test_mileage_regression_leaves_loan_open() {
    let bed = testbed().await;
    let vehicle = bed
        .vehicles
        .create(bed.company_id, vehicle_request("AB-123-CD"))
        .await
        .unwrap()
        .data
        .unwrap();

    let opened = bed
        .loans
        .open_loan(bed.company_id, complete_draft(vehicle.id, bed.client_id))
        .await
        .unwrap()
        .data
        .unwrap();

    let err = bed
        .loans
        .close_loan(opened.id, bed.company_id, close_request(9000, 40))
        .await
        .unwrap_err();

    match err {
        AppError::Validation(message) => assert!(message.contains("end_mileage")),
        other => panic!("se esperaba Validation, fue {:?}", other),
    }

    // Ni el préstamo ni el vehículo cambian tras el rechazo
    let loan = LoanRepository::find_by_id(&*bed.store, opened.id)
        .await
        .unwrap()
        .unwrap();
    assert!(loan.is_open());
    let stored = VehicleRepository::find_by_id(&*bed.store, vehicle.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, VehicleStatus::Loaned);
    assert_eq!(stored.mileage, 10000);
}

#[tokio::test]
async fn test_signature_pending_then_attach_generates_contract() {
    let bed = testbed().await;
    let vehicle = bed
        .vehicles
        .create(bed.company_id, vehicle_request("AB-123-CD"))
        .await
        .unwrap()
        .data
        .unwrap();

    let mut draft = complete_draft(vehicle.id, bed.client_id);
    draft.client_signature_url = None;
    draft.dealer_signature_url = None;

    let response = bed
        .loans
        .open_loan(bed.company_id, draft)
        .await
        .unwrap();
    let message = response.message.clone().unwrap();
    assert!(message.contains("pendiente de firma"));

    let opened = response.data.unwrap();
    assert!(!opened.contract_signed);
    assert!(opened.signed_at.is_none());
    assert!(opened.contract_url.is_none());

    // Sin firmas no hay contrato, ni siquiera bajo demanda
    let err = bed
        .loans
        .regenerate_contract(opened.id, bed.company_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Precondition(_)));

    let signed = bed
        .loans
        .attach_signatures(
            opened.id,
            bed.company_id,
            AttachSignaturesRequest {
                client_signature_url: "memory://signatures/client/2.png".to_string(),
                dealer_signature_url: "memory://signatures/dealer/2.png".to_string(),
            },
        )
        .await
        .unwrap()
        .data
        .unwrap();

    assert!(signed.contract_signed);
    assert!(signed.signed_at.is_some());
    let contract_url = signed.contract_url.expect("el contrato debe generarse al firmar");
    assert!(contract_url.contains("contracts/loan/"));
}

#[tokio::test]
async fn test_regenerate_contract_produces_new_artifact() {
    let bed = testbed().await;
    let vehicle = bed
        .vehicles
        .create(bed.company_id, vehicle_request("AB-123-CD"))
        .await
        .unwrap()
        .data
        .unwrap();

    let opened = bed
        .loans
        .open_loan(bed.company_id, complete_draft(vehicle.id, bed.client_id))
        .await
        .unwrap()
        .data
        .unwrap();
    let first_url = opened.contract_url.expect("contrato tras apertura firmada");

    let regenerated = bed
        .loans
        .regenerate_contract(opened.id, bed.company_id)
        .await
        .unwrap()
        .data
        .unwrap();
    let second_url = regenerated.contract_url.unwrap();

    assert_ne!(first_url, second_url);
}

#[tokio::test]
async fn test_close_twice_is_conflict() {
    let bed = testbed().await;
    let vehicle = bed
        .vehicles
        .create(bed.company_id, vehicle_request("AB-123-CD"))
        .await
        .unwrap()
        .data
        .unwrap();

    let opened = bed
        .loans
        .open_loan(bed.company_id, complete_draft(vehicle.id, bed.client_id))
        .await
        .unwrap()
        .data
        .unwrap();

    bed.loans
        .close_loan(opened.id, bed.company_id, close_request(10350, 40))
        .await
        .unwrap();

    let err = bed
        .loans
        .close_loan(opened.id, bed.company_id, close_request(10400, 30))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_delete_requires_closed_loan() {
    let bed = testbed().await;
    let vehicle = bed
        .vehicles
        .create(bed.company_id, vehicle_request("AB-123-CD"))
        .await
        .unwrap()
        .data
        .unwrap();

    let opened = bed
        .loans
        .open_loan(bed.company_id, complete_draft(vehicle.id, bed.client_id))
        .await
        .unwrap()
        .data
        .unwrap();

    let err = bed
        .loans
        .delete(opened.id, bed.company_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    bed.loans
        .close_loan(opened.id, bed.company_id, close_request(10350, 40))
        .await
        .unwrap();
    bed.loans.delete(opened.id, bed.company_id).await.unwrap();

    assert_eq!(bed.store.loan_count().await, 0);
}

#[tokio::test]
async fn test_cross_company_access_is_forbidden() {
    let bed = testbed().await;
    let vehicle = bed
        .vehicles
        .create(bed.company_id, vehicle_request("AB-123-CD"))
        .await
        .unwrap()
        .data
        .unwrap();

    let opened = bed
        .loans
        .open_loan(bed.company_id, complete_draft(vehicle.id, bed.client_id))
        .await
        .unwrap()
        .data
        .unwrap();

    let intruder = Uuid::new_v4();

    let err = bed.loans.get_by_id(opened.id, intruder).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = bed
        .loans
        .close_loan(opened.id, intruder, close_request(10350, 40))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = bed
        .vehicles
        .get_by_id(vehicle.id, intruder)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_loaned_status_is_reserved_to_the_engine() {
    let bed = testbed().await;
    let vehicle = bed
        .vehicles
        .create(bed.company_id, vehicle_request("AB-123-CD"))
        .await
        .unwrap()
        .data
        .unwrap();

    // Nadie marca un vehículo como prestado a mano
    let err = bed
        .vehicles
        .set_status(
            vehicle.id,
            bed.company_id,
            UpdateVehicleStatusRequest {
                status: "loaned".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Con un préstamo abierto tampoco se cambia el estado a mano
    bed.loans
        .open_loan(bed.company_id, complete_draft(vehicle.id, bed.client_id))
        .await
        .unwrap();

    let err = bed
        .vehicles
        .set_status(
            vehicle.id,
            bed.company_id,
            UpdateVehicleStatusRequest {
                status: "maintenance".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_retired_is_terminal() {
    let bed = testbed().await;
    let vehicle = bed
        .vehicles
        .create(bed.company_id, vehicle_request("AB-123-CD"))
        .await
        .unwrap()
        .data
        .unwrap();

    bed.vehicles
        .set_status(
            vehicle.id,
            bed.company_id,
            UpdateVehicleStatusRequest {
                status: "retired".to_string(),
            },
        )
        .await
        .unwrap();

    let err = bed
        .vehicles
        .set_status(
            vehicle.id,
            bed.company_id,
            UpdateVehicleStatusRequest {
                status: "available".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_vehicle_with_open_loan_cannot_be_deleted() {
    let bed = testbed().await;
    let vehicle = bed
        .vehicles
        .create(bed.company_id, vehicle_request("AB-123-CD"))
        .await
        .unwrap()
        .data
        .unwrap();

    let opened = bed
        .loans
        .open_loan(bed.company_id, complete_draft(vehicle.id, bed.client_id))
        .await
        .unwrap()
        .data
        .unwrap();

    let err = bed
        .vehicles
        .delete(vehicle.id, bed.company_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    bed.loans
        .close_loan(opened.id, bed.company_id, close_request(10350, 40))
        .await
        .unwrap();
    bed.vehicles.delete(vehicle.id, bed.company_id).await.unwrap();
}

#[tokio::test]
async fn test_loan_history_per_vehicle() {
    let bed = testbed().await;
    let vehicle = bed
        .vehicles
        .create(bed.company_id, vehicle_request("AB-123-CD"))
        .await
        .unwrap()
        .data
        .unwrap();

    let first = bed
        .loans
        .open_loan(bed.company_id, complete_draft(vehicle.id, bed.client_id))
        .await
        .unwrap()
        .data
        .unwrap();
    bed.loans
        .close_loan(first.id, bed.company_id, close_request(10350, 40))
        .await
        .unwrap();

    // Tras el cierre el vehículo vuelve a estar disponible para otro préstamo
    let mut second_draft = complete_draft(vehicle.id, bed.client_id);
    second_draft.start_mileage = Some(10350);
    let second = bed
        .loans
        .open_loan(bed.company_id, second_draft)
        .await
        .unwrap()
        .data
        .unwrap();

    let history = bed
        .loans
        .list_by_vehicle(vehicle.id, bed.company_id)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);

    let open_count = history.iter().filter(|loan| loan.is_open).count();
    assert_eq!(open_count, 1);
    assert!(history.iter().any(|loan| loan.id == second.id && loan.is_open));
}
