/*!
 * Extractors shared by v1 handlers
 *
 * - CurrentUser: identity published by the auth middleware (401 when absent)
 * - PublicId<T>: public (sqids) id from the path, decoded to the internal id
 */
mod current_user;
mod public_id;

pub use current_user::CurrentUser;
pub use public_id::{AuctionTag, PublicAuctionId, PublicId};
