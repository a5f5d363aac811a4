pub mod address;
pub mod form;
pub mod location;

pub use address::{Address, Candidate};
pub use form::{AddressForm, FormField, FormFieldId, TextInput};
pub use location::{Coordinate, HintSource, LocationHint, ViewBox};
