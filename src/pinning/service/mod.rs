mod gateway;
mod pinner;
pub(crate) mod probe;
mod upload;

pub use self::{
  gateway::{gateway_links, PUBLIC_GATEWAYS},
  pinner::{Canceller, Pinner},
  probe::SizeProbe,
  upload::{Upload, Uploader},
};
