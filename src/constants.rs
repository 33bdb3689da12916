pub const DEFAULT_CONDITION: &str = "Good";

pub mod limits {

    pub const MAX_NAME_LENGTH: usize = 100;

    pub const MAX_AUTHORIZED_BATCH: usize = 5000;

    pub const DEFAULT_NOTIFICATION_LIMIT: u64 = 100;

    pub const PHONE_NUMBER_DIGITS: usize = 10;
}

pub mod auth {

    pub const SESSION_ACTOR_KEY: &str = "actor";

    pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

    /// Seeded with the admin account; regenerate it after first login.
    pub const DEFAULT_ADMIN_API_KEY: &str = "hall3_default_api_key_please_regenerate";
}
