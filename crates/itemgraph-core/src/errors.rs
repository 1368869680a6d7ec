use itemgraph_core_types::ItemId;
use thiserror::Error;

use crate::transaction::TransactionState;

/// Result type alias using ItemGraphError
pub type Result<T> = std::result::Result<T, ItemGraphError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// This taxonomy provides a stable, structured classification of all errors
/// raised by the kernel. Each kind maps to a stable error code that can be
/// used for programmatic error handling, testing, and host-facing reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgErrorKind {
    // Transaction protocol
    InvalidState,

    // Lookup
    NotFound,
    UnknownType,
    AlreadyExists,

    // Property access
    PropertyMismatch,
    OutOfRange,

    // Structure
    AlreadyOwned,
    CycleDetected,
    IllegalReparent,
    StructureViolation,

    // Snapshot/IO
    Deserialize,
    Serialization,
    Config,

    // Internal
    Internal,
}

impl IgErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            IgErrorKind::InvalidState => "ERR_INVALID_STATE",
            IgErrorKind::NotFound => "ERR_NOT_FOUND",
            IgErrorKind::UnknownType => "ERR_UNKNOWN_TYPE",
            IgErrorKind::AlreadyExists => "ERR_ALREADY_EXISTS",
            IgErrorKind::PropertyMismatch => "ERR_PROPERTY_MISMATCH",
            IgErrorKind::OutOfRange => "ERR_OUT_OF_RANGE",
            IgErrorKind::AlreadyOwned => "ERR_ALREADY_OWNED",
            IgErrorKind::CycleDetected => "ERR_CYCLE_DETECTED",
            IgErrorKind::IllegalReparent => "ERR_ILLEGAL_REPARENT",
            IgErrorKind::StructureViolation => "ERR_STRUCTURE_VIOLATION",
            IgErrorKind::Deserialize => "ERR_DESERIALIZE",
            IgErrorKind::Serialization => "ERR_SERIALIZATION",
            IgErrorKind::Config => "ERR_CONFIG",
            IgErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries the classification used for programmatic handling plus the
/// context that helps when debugging a failed edit.
#[derive(Debug, Clone)]
pub struct IgError {
    kind: IgErrorKind,
    op: Option<String>,
    item_id: Option<ItemId>,
    property: Option<String>,
    index: Option<usize>,
    message: String,
}

impl IgError {
    /// Create a new error with the specified kind
    pub fn new(kind: IgErrorKind) -> Self {
        Self {
            kind,
            op: None,
            item_id: None,
            property: None,
            index: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add item ID context
    pub fn with_item_id(mut self, id: ItemId) -> Self {
        self.item_id = Some(id);
        self
    }

    /// Add property context
    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    /// Add index context
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> IgErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the item ID context, if any
    pub fn item_id(&self) -> Option<ItemId> {
        self.item_id
    }

    /// Get the property context, if any
    pub fn property(&self) -> Option<&str> {
        self.property.as_deref()
    }

    /// Get the index context, if any
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for IgError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(item_id) = self.item_id {
            write!(f, " (item_id: {})", item_id)?;
        }
        if let Some(property) = &self.property {
            write!(f, " (property: {})", property)?;
        }
        if let Some(index) = self.index {
            write!(f, " (index: {})", index)?;
        }
        Ok(())
    }
}

impl std::error::Error for IgError {}

// ========== End Error Facility ==========

/// Error taxonomy for object-graph operations
///
/// Only programmer errors surface here. Dangling references resolve to
/// `None`, and consistency failures at commit turn into a cancelled
/// transaction instead of an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ItemGraphError {
    // ===== Transaction Errors =====
    /// Transaction call made in a state that does not allow it
    #[error("Invalid transaction state: cannot {operation} while {state:?}")]
    InvalidState {
        operation: &'static str,
        state: TransactionState,
    },

    // ===== Lookup Errors =====
    /// Item not found in the context arena
    #[error("Item not found: {item_id}")]
    ItemNotFound { item_id: ItemId },

    /// Type name has no registered template
    #[error("Unknown item type: {type_name}")]
    UnknownType { type_name: String },

    /// Type name registered twice
    #[error("Item type already registered: {type_name}")]
    DuplicateType { type_name: String },

    // ===== Property Errors =====
    /// Descriptor used on an item whose template does not declare it
    #[error("Property {property} does not apply to item {item_id}")]
    PropertyMismatch { item_id: ItemId, property: String },

    /// Child container index out of bounds
    #[error("Index {index} out of range for {property} of item {item_id} (length {len})")]
    IndexOutOfRange {
        item_id: ItemId,
        property: String,
        index: usize,
        len: usize,
    },

    // ===== Structural Errors =====
    /// Child already has an owner; reparenting must remove it first
    #[error("Item {child_id} is already owned by item {owner_id}")]
    AlreadyOwned { child_id: ItemId, owner_id: ItemId },

    /// Insertion would make an item its own ancestor
    #[error("Cycle detected: item {item_id} cannot own one of its ancestors")]
    CycleDetected { item_id: ItemId },

    /// Illegal reparent operation
    #[error("Illegal reparent: {reason}")]
    IllegalReparent { reason: String },

    /// Container names an item missing from the arena
    #[error("Item {owner_id} contains unknown child {child_id}")]
    MissingChild { owner_id: ItemId, child_id: ItemId },

    /// Item contained by more than one container
    #[error("Item {child_id} has multiple owners: {owner_ids:?}")]
    MultipleOwners {
        child_id: ItemId,
        owner_ids: Vec<ItemId>,
    },

    /// Parent map disagrees with container contents
    #[error("Parent of item {child_id} is recorded as {recorded:?} but owner is {actual:?}")]
    ParentMismatch {
        child_id: ItemId,
        recorded: Option<ItemId>,
        actual: Option<ItemId>,
    },

    // ===== Snapshot Errors =====
    /// Blob does not match the expected persisted layout
    #[error("Cannot deserialize item: {reason}")]
    Deserialize { reason: String },

    /// Serialization error (JSON encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    // ===== Configuration Errors =====
    /// Malformed configuration
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    // ===== Internal Errors =====
    /// Replaying a recorded operation did not find the recorded state
    #[error("Replay diverged: {message}")]
    ReplayDiverged { message: String },

    /// Every item id has been handed out
    #[error("Item ids exhausted")]
    IdsExhausted,
}

impl From<serde_json::Error> for ItemGraphError {
    fn from(err: serde_json::Error) -> Self {
        ItemGraphError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Conversion from ItemGraphError to IgError
impl From<ItemGraphError> for IgError {
    fn from(err: ItemGraphError) -> Self {
        match err {
            ItemGraphError::InvalidState { operation, state } => {
                IgError::new(IgErrorKind::InvalidState)
                    .with_op(operation)
                    .with_message(format!("transaction state is {:?}", state))
            }

            ItemGraphError::ItemNotFound { item_id } => IgError::new(IgErrorKind::NotFound)
                .with_item_id(item_id)
                .with_message("Item not found"),

            ItemGraphError::UnknownType { type_name } => IgError::new(IgErrorKind::UnknownType)
                .with_message(format!("Unknown item type: {}", type_name)),

            ItemGraphError::DuplicateType { type_name } => {
                IgError::new(IgErrorKind::AlreadyExists)
                    .with_message(format!("Item type already registered: {}", type_name))
            }

            ItemGraphError::PropertyMismatch { item_id, property } => {
                IgError::new(IgErrorKind::PropertyMismatch)
                    .with_item_id(item_id)
                    .with_property(property)
                    .with_message("Property does not apply to item")
            }

            ItemGraphError::IndexOutOfRange {
                item_id,
                property,
                index,
                len,
            } => IgError::new(IgErrorKind::OutOfRange)
                .with_item_id(item_id)
                .with_property(property)
                .with_index(index)
                .with_message(format!("length is {}", len)),

            ItemGraphError::AlreadyOwned { child_id, owner_id } => {
                IgError::new(IgErrorKind::AlreadyOwned)
                    .with_item_id(child_id)
                    .with_message(format!("already owned by {}", owner_id))
            }

            ItemGraphError::CycleDetected { item_id } => IgError::new(IgErrorKind::CycleDetected)
                .with_item_id(item_id)
                .with_message("Insertion would create an ownership cycle"),

            ItemGraphError::IllegalReparent { reason } => {
                IgError::new(IgErrorKind::IllegalReparent).with_message(reason)
            }

            ItemGraphError::MissingChild { owner_id, child_id } => {
                IgError::new(IgErrorKind::StructureViolation)
                    .with_item_id(owner_id)
                    .with_message(format!("unknown child {}", child_id))
            }

            ItemGraphError::MultipleOwners {
                child_id,
                owner_ids,
            } => IgError::new(IgErrorKind::StructureViolation)
                .with_item_id(child_id)
                .with_message(format!("multiple owners {:?}", owner_ids)),

            ItemGraphError::ParentMismatch {
                child_id,
                recorded,
                actual,
            } => IgError::new(IgErrorKind::StructureViolation)
                .with_item_id(child_id)
                .with_message(format!(
                    "parent recorded as {:?}, owner is {:?}",
                    recorded, actual
                )),

            ItemGraphError::Deserialize { reason } => {
                IgError::new(IgErrorKind::Deserialize).with_message(reason)
            }

            ItemGraphError::Serialization { message } => {
                IgError::new(IgErrorKind::Serialization).with_message(message)
            }

            ItemGraphError::Config { message } => {
                IgError::new(IgErrorKind::Config).with_message(message)
            }

            ItemGraphError::ReplayDiverged { message } => {
                IgError::new(IgErrorKind::Internal).with_message(message)
            }

            ItemGraphError::IdsExhausted => {
                IgError::new(IgErrorKind::Internal).with_message("Item ids exhausted")
            }
        }
    }
}
