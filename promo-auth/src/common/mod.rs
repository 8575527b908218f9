mod models;

pub use models::{
    CallbackParams, LinkedAccount, PendingAuthorization, TokenGrant, TokenRecord, UserIdentity,
    EARLY_REFRESH_SECS,
};
