#![deny(warnings)]

mod kernargs;
mod packet;
mod ring;

pub use kernargs::{implicit_args_offset, ImplicitArgs};
pub use packet::{
    packet_type, setup_dims, DispatchPacket, FenceScope, PacketRecord, PacketType,
    HEADER_ACQUIRE_FENCE_SCOPE, HEADER_BARRIER, HEADER_RELEASE_FENCE_SCOPE, HEADER_TYPE,
    INVALID_HEAD, PACKET_HEAD_BYTES, SETUP_DIMENSIONS,
};
pub use ring::RingIndex;
