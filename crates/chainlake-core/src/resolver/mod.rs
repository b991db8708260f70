//! Identifier resolution against the metadata index.

mod block;
mod tx;

pub use block::BlockResolver;
pub use tx::TxResolver;

use tonic::Status;

use crate::config::AppConfig;
use crate::errors::ServerError;

/// Requests must name a tag at or below the declared latest generation.
pub(crate) fn validate_block_tag(config: &AppConfig, tag: u32) -> Result<(), ServerError> {
    let latest_tag = config.chain.latest_block_tag;
    if tag > latest_tag {
        return Err(Status::invalid_argument(format!(
            "requested tag is unavailable: latest tag is {latest_tag}"
        ))
        .into());
    }
    Ok(())
}
