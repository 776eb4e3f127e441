mod billing;
mod id;
mod period;

pub use self::{billing::*, id::*, period::*};
use crate::entity::{BikeId, CreatedAt, Position, UpdatedAt, UserId};
use destructure::Destructure;
use vodca::References;

/// A rental is open while `ended_at` is `None` and closed, for good, once it is set.
#[derive(Debug, Clone, PartialEq, References, Destructure)]
pub struct Rental {
    id: RentalId,
    user_id: UserId,
    bike_id: BikeId,
    started_at: StartedAt,
    start_position: Position,
    ended_at: Option<EndedAt>,
    end_position: Option<Position>,
    duration: Option<DurationMinutes>,
    cost: RentalCost,
    created_at: CreatedAt<Rental>,
    updated_at: UpdatedAt<Rental>,
}

impl Rental {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: RentalId,
        user_id: UserId,
        bike_id: BikeId,
        started_at: StartedAt,
        start_position: Position,
        ended_at: Option<EndedAt>,
        end_position: Option<Position>,
        duration: Option<DurationMinutes>,
        cost: RentalCost,
        created_at: CreatedAt<Rental>,
        updated_at: UpdatedAt<Rental>,
    ) -> Self {
        Self {
            id,
            user_id,
            bike_id,
            started_at,
            start_position,
            ended_at,
            end_position,
            duration,
            cost,
            created_at,
            updated_at,
        }
    }

    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}
