/// Identity collaborator: the single question collision editing asks.
pub trait Identity {
    fn can_edit_collision(&self) -> bool;
}

/// Role as reported by the session layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    Player,
    Admin,
}

impl Identity for Role {
    fn can_edit_collision(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl Identity for bool {
    fn can_edit_collision(&self) -> bool {
        *self
    }
}
