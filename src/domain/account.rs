use uuid::Uuid;

use super::order::ContactDetails;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub phone: String,
    pub address: String,
}

/// A registered shopper. Registration and credentials live elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub profile: Option<Profile>,
}

impl Account {
    /// Checkout form defaults. Phone and address come from the profile
    /// when there is one.
    pub fn contact_defaults(&self) -> ContactDetails {
        let (phone, address) = self
            .profile
            .as_ref()
            .map(|p| (p.phone.clone(), p.address.clone()))
            .unwrap_or_default();
        ContactDetails {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone,
            address,
        }
    }
}
