use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::Address;

/// Used for both create and full replace; every field except `landmark` is required.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct AddressRequest {
    #[validate(length(min = 1, message = "house_name is required."))]
    pub house_name: String,
    #[validate(length(min = 1, message = "area_street_sector_village is required."))]
    pub area_street_sector_village: String,
    pub landmark: Option<String>,
    #[validate(length(min = 1, max = 12, message = "pincode is required."))]
    pub pincode: String,
    #[validate(length(min = 1, message = "town_city is required."))]
    pub town_city: String,
    #[validate(length(min = 1, message = "state is required."))]
    pub state: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct AddressList {
    #[schema(value_type = Vec<Address>)]
    pub items: Vec<Address>,
}
