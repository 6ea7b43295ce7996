use std::fmt;

use chrono::Local;

use crate::{device::CaptureDevice, guard::ClaimSuccess};

/// Read-only confirmation shown once a claim lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptView {
    pub title: &'static str,
    pub claim_id: String,
    pub item_name: String,
    pub location: String,
    pub claimant_name: String,
    pub claimed_at: String,
}

impl ReceiptView {
    pub fn render(success: &ClaimSuccess) -> Self {
        Self {
            title: "CLAIM SUCCESSFUL",
            claim_id: success.claim_id.clone().unwrap_or_else(|| "N/A".to_string()),
            item_name: success.item.name.clone(),
            location: success.item.location.clone(),
            claimant_name: success.claimant_name.clone(),
            claimed_at: success
                .timestamp
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
        }
    }
}

impl fmt::Display for ReceiptView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "Claim ID:  {}", self.claim_id)?;
        writeln!(f, "Item Name: {}", self.item_name)?;
        writeln!(f, "Location:  {}", self.location)?;
        writeln!(f, "Name:      {}", self.claimant_name)?;
        write!(f, "Date:      {}", self.claimed_at)
    }
}

/// The success path's only way to close the camera.
pub(crate) fn emit(success: &ClaimSuccess, device: &CaptureDevice) -> ReceiptView {
    device.release();
    ReceiptView::render(success)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::session::ItemReference;

    fn success(claim_id: Option<&str>) -> ClaimSuccess {
        ClaimSuccess {
            claim_id: claim_id.map(str::to_string),
            item: ItemReference {
                id: 9,
                name: "Blue umbrella".to_string(),
                location: "Library".to_string(),
            },
            claimant_identifier: "2021002".to_string(),
            claimant_name: "Ben Cruz".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_render() {
        let view = ReceiptView::render(&success(Some("C-100")));
        assert_eq!(view.title, "CLAIM SUCCESSFUL");
        assert_eq!(view.claim_id, "C-100");
        assert_eq!(view.item_name, "Blue umbrella");
        assert_eq!(view.claimant_name, "Ben Cruz");
    }

    #[test]
    fn test_missing_claim_id() {
        assert_eq!(ReceiptView::render(&success(None)).claim_id, "N/A");
    }

    #[test]
    fn test_display_lines() {
        let text = ReceiptView::render(&success(Some("C-100"))).to_string();
        assert!(text.starts_with("CLAIM SUCCESSFUL\n"));
        assert!(text.contains("Claim ID:  C-100"));
        assert!(text.contains("Location:  Library"));
    }
}
