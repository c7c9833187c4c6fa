use serde::Deserialize;

#[derive(Deserialize)]
pub struct ScanRequest {
    #[serde(alias = "qrData")]
    pub qr_data: Option<String>,
}
