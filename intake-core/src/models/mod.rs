mod circuit;
mod customer_vendor;
mod document;
mod document_type;
mod responsibility_centre;
mod sub_type;
mod user_profile;

pub use circuit::Circuit;
pub use customer_vendor::CustomerVendor;
pub use document::{CreatedDocument, DocumentCreateRequest};
pub use document_type::{DocumentType, TierType};
pub use responsibility_centre::ResponsibilityCentre;
pub use sub_type::{NewSubType, SubType};
pub use user_profile::UserProfile;
