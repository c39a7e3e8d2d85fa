//! Assignment emails queued in the outbox.

use chrono::DateTime;

use crate::models::{Donor, FoodListing, OutgoingMessage, Volunteer};

/// The two messages sent when a volunteer is bound to a listing:
/// one to the donor, one to the volunteer.
pub fn assignment_messages(
    listing: &FoodListing,
    volunteer: &Volunteer,
    donor: &Donor,
) -> [OutgoingMessage; 2] {
    let donor_name = donor.name.as_deref().unwrap_or("Donor");

    let to_donor = OutgoingMessage {
        recipient: donor.email.clone(),
        subject: "Volunteer Assigned for Your Food Listing".to_string(),
        body: format!(
            "<h1>Volunteer Assigned</h1>\
             <p>Your food listing ({name}) has been assigned to a volunteer.</p>\
             <h2>Volunteer Details:</h2>\
             <p>Name: {vname}</p><p>Email: {vemail}</p><p>Phone: {vmobile}</p>",
            name = escape(&listing.name),
            vname = escape(&volunteer.full_name),
            vemail = escape(&volunteer.email),
            vmobile = escape(&volunteer.mobile),
        ),
    };

    let to_volunteer = OutgoingMessage {
        recipient: volunteer.email.clone(),
        subject: "New Food Listing Assignment".to_string(),
        body: format!(
            "<h1>New Food Listing Assignment</h1>\
             <p>You've been assigned to collect a food listing:</p>\
             <h2>Listing Details:</h2>\
             <p>Name: {name}</p><p>Quantity: {quantity}</p><p>Expiration: {expires}</p>\
             <h2>Pickup Address:</h2><p>{address}</p>\
             <h2>Contact Information:</h2>\
             <p>Lister Name: {dname}</p><p>Lister Email: {demail}</p>",
            name = escape(&listing.name),
            quantity = listing.quantity,
            expires = format_date(listing.expiration_at),
            address = escape(&listing.address.one_line()),
            dname = escape(donor_name),
            demail = escape(&donor.email),
        ),
    };

    [to_donor, to_volunteer]
}

fn format_date(unix: i64) -> String {
    DateTime::from_timestamp(unix, 0)
        .map(|dt| dt.format("%d %b %Y").to_string())
        .unwrap_or_else(|| unix.to_string())
}

/// Minimal HTML escaping for user-supplied text.
fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::ListingStatus;
    use crate::models::Address;

    fn listing() -> FoodListing {
        FoodListing {
            id: 7,
            donor_id: "donor-1".to_string(),
            name: "Biryani <party tray>".to_string(),
            description: "Veg".to_string(),
            quantity: 30,
            expiration_at: 1_704_067_200,
            status: ListingStatus::Assigned,
            volunteer_id: Some(3),
            address: Address {
                street: "9 Lake View".to_string(),
                city: "Hyderabad".to_string(),
                state: "TS".to_string(),
                postal_code: "500001".to_string(),
                landmark: None,
            },
            image_mime_type: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn volunteer() -> Volunteer {
        Volunteer {
            id: 3,
            full_name: "Meera".to_string(),
            email: "meera@example.org".to_string(),
            mobile: "9000000004".to_string(),
            gender: "F".to_string(),
            area: "Banjara Hills".to_string(),
            address: "Road 12".to_string(),
            pincode: "500034".to_string(),
            is_active: true,
            created_at: 0,
        }
    }

    #[test]
    fn one_message_each_for_donor_and_volunteer() {
        let donor = Donor {
            id: "donor-1".to_string(),
            email: "donor@example.org".to_string(),
            name: None,
        };
        let [to_donor, to_volunteer] = assignment_messages(&listing(), &volunteer(), &donor);

        assert_eq!(to_donor.recipient, "donor@example.org");
        assert!(to_donor.body.contains("Meera"));
        assert!(to_donor.body.contains("9000000004"));

        assert_eq!(to_volunteer.recipient, "meera@example.org");
        assert!(to_volunteer.body.contains("Quantity: 30"));
        assert!(to_volunteer.body.contains("01 Jan 2024"));
        assert!(to_volunteer.body.contains("9 Lake View, Hyderabad, TS - 500001"));
        assert!(to_volunteer.body.contains("Lister Name: Donor"));
    }

    #[test]
    fn listing_names_are_escaped() {
        let donor = Donor {
            id: "d".to_string(),
            email: "d@example.org".to_string(),
            name: Some("D".to_string()),
        };
        let [to_donor, _] = assignment_messages(&listing(), &volunteer(), &donor);
        assert!(to_donor.body.contains("Biryani &lt;party tray&gt;"));
        assert!(!to_donor.body.contains("<party"));
    }
}
