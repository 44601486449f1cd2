mod domain_store;

pub use domain_store::BooleanVariable;
pub use domain_store::Cause;
pub use domain_store::DomainConflict;
pub use domain_store::DomainStore;
pub use domain_store::DomainVariable;
pub use domain_store::IntegerVariable;
pub use domain_store::SetVariable;
