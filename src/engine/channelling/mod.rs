mod channel_info;
mod literaliser;
mod synchroniser;

pub use channel_info::ChannelInfo;
pub use channel_info::LiteraliserId;
pub use literaliser::Literaliser;
pub use synchroniser::SatDomainSynchroniser;
