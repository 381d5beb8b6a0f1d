//! Servicio de ensamblado de contratos
//!
//! Renderiza el contrato de préstamo como función determinista del estado
//! acumulado: mismas entradas, mismos bytes. El orden de las secciones es
//! significativo y fijo. Las imágenes referenciadas (firmas, logo) se
//! resuelven de forma degradable: una imagen que no carga se sustituye por un
//! placeholder visible y etiquetado, nunca aborta el render. La persistencia
//! del artefacto (nombre, subida, URL pública) queda fuera de este servicio.

use std::sync::Arc;

use crate::models::client::Client;
use crate::models::company::CompanyProfile;
use crate::models::loan_vehicle::LoanVehicle;
use crate::models::vehicle_loan::VehicleLoan;
use crate::storage::ObjectStorage;
use crate::utils::errors::{AppError, AppResult};
use crate::utils::images::sniff_content_type;

pub const CONTRACT_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Las diez condiciones estándar que cierran todo contrato de préstamo
pub const LOAN_CONDITIONS: [&str; 10] = [
    "Le véhicule est prêté à titre gratuit pour la durée des réparations du véhicule du client.",
    "L'emprunteur s'engage à utiliser le véhicule en bon père de famille et à le restituer dans l'état où il lui a été remis.",
    "Le véhicule ne peut être conduit que par le conducteur désigné au présent contrat, titulaire d'un permis de conduire en cours de validité.",
    "L'emprunteur s'engage à restituer le véhicule avec le même niveau de carburant qu'à la remise.",
    "Toute utilisation du véhicule en dehors du territoire national est interdite sans accord écrit du prêteur.",
    "L'emprunteur est responsable des contraventions et infractions commises pendant la durée du prêt.",
    "En cas d'accident, l'emprunteur s'engage à prévenir le prêteur sous 24 heures et à remplir un constat amiable.",
    "La franchise d'assurance reste à la charge de l'emprunteur en cas de sinistre responsable.",
    "Le prêteur se réserve le droit de reprendre le véhicule à tout moment en cas de manquement aux présentes conditions.",
    "La restitution du véhicule donne lieu à un état des lieux contradictoire consigné dans le rapport de restitution.",
];

/// Artefacto de documento opaco devuelto por el ensamblador
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentArtifact {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

/// Entrada completa del render, con las imágenes ya resueltas (o ausentes)
pub struct ContractRenderInput<'a> {
    pub loan: &'a VehicleLoan,
    pub vehicle: &'a LoanVehicle,
    pub client: &'a Client,
    pub company: &'a CompanyProfile,
    pub client_signature: Option<Vec<u8>>,
    pub dealer_signature: Option<Vec<u8>>,
    pub logo: Option<Vec<u8>>,
}

pub struct ContractAssembler {
    storage: Arc<dyn ObjectStorage>,
}

impl ContractAssembler {
    pub fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        Self { storage }
    }

    /// Ensambla el contrato de un préstamo completamente firmado.
    ///
    /// Precondición: ambas firmas referenciadas; sin ellas falla con
    /// `Precondition` y no produce artefacto. La carga de cada imagen es
    /// degradable: un fallo deja un placeholder, nunca tumba el render.
    pub async fn assemble(
        &self,
        loan: &VehicleLoan,
        vehicle: &LoanVehicle,
        client: &Client,
        company: &CompanyProfile,
    ) -> AppResult<DocumentArtifact> {
        let client_signature_url = loan.client_signature_url.as_deref().ok_or_else(|| {
            AppError::Precondition(
                "No se puede generar el contrato: falta la firma del cliente".to_string(),
            )
        })?;
        let dealer_signature_url = loan.dealer_signature_url.as_deref().ok_or_else(|| {
            AppError::Precondition(
                "No se puede generar el contrato: falta la firma del taller".to_string(),
            )
        })?;

        log::info!("📄 Ensamblando contrato del préstamo {}", loan.id);

        let client_signature = self.fetch_image(client_signature_url, "firma del cliente").await;
        let dealer_signature = self.fetch_image(dealer_signature_url, "firma del taller").await;
        let logo = match &company.logo_url {
            Some(url) => self.fetch_image(url, "logo de la empresa").await,
            None => None,
        };

        let artifact = render_contract(&ContractRenderInput {
            loan,
            vehicle,
            client,
            company,
            client_signature,
            dealer_signature,
            logo,
        });

        log::info!(
            "✅ Contrato del préstamo {} renderizado ({} bytes)",
            loan.id,
            artifact.bytes.len()
        );

        Ok(artifact)
    }

    async fn fetch_image(&self, url: &str, label: &str) -> Option<Vec<u8>> {
        match self.storage.fetch(url).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log::warn!("⚠️ No se pudo cargar {} ({}): {}", label, url, e);
                None
            }
        }
    }
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn data_uri(bytes: &[u8]) -> String {
    let encoded = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, bytes);
    format!("data:{};base64,{}", sniff_content_type(bytes), encoded)
}

fn signature_cell(label: &str, image: &Option<Vec<u8>>) -> String {
    match image {
        Some(bytes) => format!(
            r#"<div class="signature"><img src="{}" alt="{}"/><p>{}</p></div>"#,
            data_uri(bytes),
            escape_html(label),
            escape_html(label)
        ),
        None => format!(
            r#"<div class="signature"><div class="signature-missing">SIGNATURE MANQUANTE</div><p>{}</p></div>"#,
            escape_html(label)
        ),
    }
}

fn field(label: &str, value: &str) -> String {
    format!(
        "<p><span class=\"label\">{} :</span> {}</p>",
        label,
        escape_html(value)
    )
}

fn optional_field(label: &str, value: &Option<String>) -> String {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => field(label, v),
        _ => String::new(),
    }
}

/// Código de verificación del sello de autenticidad, determinista por
/// préstamo: mismas entradas, mismo código.
fn verification_code(input: &ContractRenderInput) -> String {
    let digest = md5::compute(format!(
        "{}|{}|{}",
        input.loan.id, input.vehicle.registration_number, input.company.name
    ));
    format!("{:x}", digest)[..12].to_uppercase()
}

/// Renderiza el contrato. Función pura: no consulta reloj ni I/O.
///
/// Orden de secciones, fijo y significativo: encabezado/logo → prestamista →
/// emprunteur/conductor → vehículo y lecturas de salida → fechas y seguro →
/// notas → salto de página → bloque de firmas → sello de autenticidad →
/// las diez condiciones → pie legal.
pub fn render_contract(input: &ContractRenderInput) -> DocumentArtifact {
    let loan = input.loan;
    let vehicle = input.vehicle;
    let client = input.client;
    let company = input.company;

    let mut html = String::with_capacity(16 * 1024);

    html.push_str(
        r#"<!DOCTYPE html>
<html lang="fr">
<head>
<meta charset="utf-8"/>
<title>Contrat de prêt de véhicule</title>
<style>
body { font-family: Helvetica, Arial, sans-serif; font-size: 12px; color: #1a1a1a; margin: 32px; }
h1 { font-size: 20px; text-align: center; }
h2 { font-size: 14px; border-bottom: 1px solid #999; padding-bottom: 2px; margin-top: 18px; }
.label { font-weight: bold; }
.header { display: flex; align-items: center; justify-content: space-between; }
.header img { max-height: 64px; }
.page-break { page-break-after: always; }
.signatures { display: flex; justify-content: space-around; margin-top: 24px; }
.signature { text-align: center; width: 40%; }
.signature img { max-height: 90px; }
.signature-missing { border: 1px dashed #b00; color: #b00; padding: 24px 8px; font-weight: bold; }
.authenticity { margin-top: 24px; border: 2px double #555; padding: 8px; text-align: center; font-size: 10px; }
.conditions { font-size: 10px; }
.footer { margin-top: 24px; font-size: 9px; color: #555; text-align: center; }
</style>
</head>
<body>
"#,
    );

    // 1. Encabezado con logo
    html.push_str("<div class=\"header\">");
    if let Some(logo) = &input.logo {
        html.push_str(&format!(
            "<img src=\"{}\" alt=\"{}\"/>",
            data_uri(logo),
            escape_html(&company.name)
        ));
    }
    html.push_str(&format!(
        "<h1>Contrat de prêt de véhicule</h1><div>{}</div></div>\n",
        escape_html(&company.name)
    ));

    // 2. Prestamista
    html.push_str("<h2>Le prêteur</h2>\n");
    html.push_str(&field("Raison sociale", &company.name));
    html.push_str(&field("Adresse", &company.address));
    html.push_str(&optional_field("SIRET", &company.siret));
    html.push_str(&optional_field("Téléphone", &company.phone));
    html.push_str(&optional_field("Email", &company.email));

    // 3. Emprunteur y conductor
    html.push_str("<h2>L'emprunteur et le conducteur</h2>\n");
    html.push_str(&field("Client", &client.full_name()));
    html.push_str(&optional_field("Adresse", &client.address));
    html.push_str(&optional_field("Téléphone", &client.phone));
    html.push_str(&field("Conducteur désigné", &loan.driver.name));
    html.push_str(&field("Permis de conduire n°", &loan.driver.license_number));
    html.push_str(&field(
        "Permis délivré le",
        &loan.driver.license_issue_date.format("%d/%m/%Y").to_string(),
    ));
    html.push_str(&field(
        "Né(e) le",
        &format!(
            "{} à {}",
            loan.driver.birth_date.format("%d/%m/%Y"),
            loan.driver.birth_place
        ),
    ));

    // 4. Vehículo y lecturas de salida
    html.push_str("<h2>Le véhicule prêté</h2>\n");
    html.push_str(&field(
        "Véhicule",
        &format!("{} {}", vehicle.make, vehicle.model),
    ));
    html.push_str(&field("Immatriculation", &vehicle.registration_number));
    html.push_str(&optional_field("N° de châssis", &vehicle.chassis_number));
    html.push_str(&optional_field("N° de moteur", &vehicle.engine_number));
    html.push_str(&optional_field("Couleur", &vehicle.color));
    html.push_str(&field(
        "Kilométrage au départ",
        &format!("{} km", loan.start_mileage),
    ));
    html.push_str(&field(
        "Niveau de carburant au départ",
        &format!("{}%", loan.start_fuel_level),
    ));

    // 5. Fechas del préstamo y seguro
    html.push_str("<h2>Durée du prêt et assurance</h2>\n");
    html.push_str(&field(
        "Date de début",
        &loan.start_date.format("%d/%m/%Y").to_string(),
    ));
    html.push_str(&field(
        "Date de restitution prévue",
        &loan.expected_end_date.format("%d/%m/%Y").to_string(),
    ));
    html.push_str(&field("Assureur", &loan.insurer_name));
    html.push_str(&field("Police n°", &loan.policy_number));

    // 6. Notas libres, solo si existen
    if let Some(notes) = loan.notes.as_deref() {
        if !notes.trim().is_empty() {
            html.push_str("<h2>Observations</h2>\n");
            html.push_str(&format!("<p>{}</p>\n", escape_html(notes)));
        }
    }

    // 7. Salto de página antes del bloque de firmas
    html.push_str("<div class=\"page-break\"></div>\n");

    // 8. Bloque de firmas en posiciones fijas
    if let Some(signed_at) = loan.signed_at {
        html.push_str(&format!(
            "<p>Fait le {}</p>\n",
            signed_at.format("%d/%m/%Y")
        ));
    }
    html.push_str("<div class=\"signatures\">\n");
    html.push_str(&signature_cell("Signature du client", &input.client_signature));
    html.push_str(&signature_cell("Signature du prêteur", &input.dealer_signature));
    html.push_str("</div>\n");

    // 9. Sello de autenticidad
    html.push_str(&format!(
        "<div class=\"authenticity\">{} — Document authentifié — Code {}</div>\n",
        escape_html(&company.name),
        verification_code(input)
    ));

    // 10. Las diez condiciones estándar
    html.push_str("<h2>Conditions générales du prêt</h2>\n<ol class=\"conditions\">\n");
    for condition in LOAN_CONDITIONS {
        html.push_str(&format!("<li>{}</li>\n", condition));
    }
    html.push_str("</ol>\n");

    // 11. Pie con identificadores legales
    html.push_str(&format!(
        "<div class=\"footer\">{} — {}{}</div>\n",
        escape_html(&company.name),
        escape_html(&company.address),
        company
            .siret
            .as_deref()
            .map(|siret| format!(" — SIRET {}", escape_html(siret)))
            .unwrap_or_default()
    ));

    html.push_str("</body>\n</html>\n");

    DocumentArtifact {
        bytes: html.into_bytes(),
        content_type: CONTRACT_CONTENT_TYPE,
    }
}
