//! UseCase layer: application operations built on the domain traits.

mod admit_client;
mod broadcast_message;
mod disconnect_client;
mod list_participants;

pub use admit_client::{Admission, AdmitClientUseCase};
pub use broadcast_message::{BroadcastMessageUseCase, BroadcastReport};
pub use disconnect_client::DisconnectClientUseCase;
pub use list_participants::ListParticipantsUseCase;
