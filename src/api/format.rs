use serde_json::{json, Value};

use crate::database::models::Resident;

/// Masks a UID down to its last four digits for display and export.
/// Anything shorter than four characters is fully masked.
pub fn mask_uid(uid: &str) -> String {
    let chars: Vec<char> = uid.chars().collect();
    if chars.len() <= 4 {
        return "X".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "X".repeat(chars.len() - 4), visible)
}

/// Resident wire format. The UID is masked on the way out; the full value
/// never leaves the database through the API.
pub fn resident_to_api_value(resident: &Resident) -> Value {
    json!({
        "id": resident.id,
        "name": &resident.name,
        "uid": resident.uid.as_deref().map(mask_uid),
        "date_of_birth": resident.date_of_birth,
        "gender": &resident.gender,
        "mobile_number": &resident.mobile_number,
        "health_id": &resident.health_id,
        "district": &resident.district,
        "mandal_name": &resident.mandal_name,
        "mandal_code": resident.mandal_code,
        "sec_name": &resident.sec_name,
        "sec_code": resident.sec_code,
        "rural_urban": &resident.rural_urban,
        "phc_name": &resident.phc_name,
        "cluster": &resident.cluster,
        "door_no": &resident.door_no,
        "address": &resident.address,
        "household_id": &resident.household_id,
        "updated_at": resident.updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_all_but_last_four() {
        assert_eq!(mask_uid("123456789012"), "XXXXXXXX9012");
        assert_eq!(mask_uid("98765"), "X8765");
    }

    #[test]
    fn short_values_fully_masked() {
        assert_eq!(mask_uid("123"), "XXX");
        assert_eq!(mask_uid(""), "");
    }
}
