use super::domain::{Actor, ActorId, Role};

/// Operations an actor may need authority for. Each service entry point
/// declares exactly one capability and checks it before touching state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    CreateBooking,
    ApproveBooking,
    DenyBooking,
    CancelBooking,
    RegisterField,
    DeleteField,
    StartDay,
    FinishHunt,
    AttachReview,
}

impl Capability {
    pub const fn action(self) -> &'static str {
        match self {
            Self::CreateBooking => "create a booking",
            Self::ApproveBooking => "approve a booking",
            Self::DenyBooking => "deny a booking",
            Self::CancelBooking => "cancel a booking",
            Self::RegisterField => "register a field",
            Self::DeleteField => "delete a field",
            Self::StartDay => "start a hunt day",
            Self::FinishHunt => "finish a hunt",
            Self::AttachReview => "attach a review",
        }
    }

    /// Roles that hold the capability outright, regardless of ownership.
    const fn privileged_roles(self) -> &'static [Role] {
        match self {
            Self::CreateBooking => &[
                Role::ShootingMember,
                Role::InternationalHunter,
                Role::GuideMember,
                Role::Admin,
            ],
            Self::ApproveBooking | Self::DenyBooking => &[Role::Admin],
            Self::CancelBooking => &[Role::Admin],
            Self::RegisterField => &[Role::Admin, Role::LandownerMember],
            Self::DeleteField => &[Role::Admin],
            Self::StartDay | Self::FinishHunt | Self::AttachReview => &[Role::Admin],
        }
    }

    /// Whether a matching ownership relation also grants the capability.
    const fn relation_grants(self) -> bool {
        match self {
            Self::ApproveBooking
            | Self::DenyBooking
            | Self::CancelBooking
            | Self::StartDay
            | Self::FinishHunt
            | Self::AttachReview => true,
            Self::CreateBooking | Self::RegisterField | Self::DeleteField => false,
        }
    }
}

/// How the acting party relates to the entity being touched.
#[derive(Debug, Clone, Copy)]
pub enum Relation<'a> {
    None,
    /// Actor must be the owner of the field in question.
    OwnerOf(&'a ActorId),
    /// Actor must be the requester of the booking in question.
    RequesterOf(&'a ActorId),
}

impl Relation<'_> {
    fn matches(&self, actor: &ActorId) -> bool {
        match self {
            Relation::None => false,
            Relation::OwnerOf(owner) => *owner == actor,
            Relation::RequesterOf(requester) => *requester == actor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AccessError {
    #[error("actor {actor} is not in good standing; operation refused")]
    NotCompliant { actor: ActorId },
    #[error("actor {actor} ({role}) may not {action}")]
    Forbidden {
        actor: ActorId,
        role: Role,
        action: &'static str,
    },
}

/// Uniform pre-check run by every mutating operation: compliance first,
/// then role set or ownership relation.
pub fn require(
    actor: &Actor,
    capability: Capability,
    relation: Relation<'_>,
) -> Result<(), AccessError> {
    if !actor.compliant {
        return Err(AccessError::NotCompliant {
            actor: actor.id.clone(),
        });
    }

    if capability.privileged_roles().contains(&actor.role) {
        return Ok(());
    }

    if capability.relation_grants() && relation.matches(&actor.id) {
        return Ok(());
    }

    Err(AccessError::Forbidden {
        actor: actor.id.clone(),
        role: actor.role,
        action: capability.action(),
    })
}
