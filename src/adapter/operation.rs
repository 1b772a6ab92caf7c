use std::fmt;

/// Every call the adapter exposes, named as its hosting action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Connect,
    Disconnect,
    Insert,
    InsertMany,
    FindById,
    FindByIds,
    Find,
    FindOne,
    Count,
    UpdateById,
    UpdateMany,
    RemoveById,
    RemoveMany,
    Clear,
}

impl Operation {
    /// CRUD operations reachable as service actions, in contract order.
    pub const ACTIONS: &'static [Operation] = &[
        Operation::Insert,
        Operation::InsertMany,
        Operation::Find,
        Operation::FindOne,
        Operation::FindById,
        Operation::FindByIds,
        Operation::UpdateById,
        Operation::UpdateMany,
        Operation::RemoveById,
        Operation::RemoveMany,
        Operation::Count,
        Operation::Clear,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Connect => "connect",
            Operation::Disconnect => "disconnect",
            Operation::Insert => "insert",
            Operation::InsertMany => "insertMany",
            Operation::FindById => "findById",
            Operation::FindByIds => "findByIds",
            Operation::Find => "find",
            Operation::FindOne => "findOne",
            Operation::Count => "count",
            Operation::UpdateById => "updateById",
            Operation::UpdateMany => "updateMany",
            Operation::RemoveById => "removeById",
            Operation::RemoveMany => "removeMany",
            Operation::Clear => "clear",
        }
    }

    /// Resolve an action name. `get`, `update` and `remove` are accepted as
    /// short forms of the id-addressed operations. Lifecycle operations are
    /// not actions.
    pub fn from_action(name: &str) -> Option<Operation> {
        match name {
            "get" => Some(Operation::FindById),
            "update" => Some(Operation::UpdateById),
            "remove" => Some(Operation::RemoveById),
            _ => Self::ACTIONS.iter().copied().find(|op| op.as_str() == name),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
