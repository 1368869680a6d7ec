pub mod item;
pub mod template;
pub mod value;

pub use item::Item;
pub use template::{PropertyKind, PropertyRef, Template, TemplateBuilder, TemplateId, TemplateRegistry};
pub use value::{PropertyValue, Value};
