// Default fallback URL for the Indhive API. Prefer environment variables.
pub const SERVER_API_URL: &str = "http://localhost:8080";

// Key value store keys
pub const TOKEN_KEY: &str = "token";
pub const REMEMBERED_EMAIL_KEY: &str = "rememberedEmail";

// Keyring identity for the persisted credential
pub const SERVICE_NAME_FOR_KEYRING: &str = "indhive";

// File store name, created under the user config directory
pub const FILE_STORE_DIR: &str = "indhive";
pub const FILE_STORE_NAME: &str = "session.json";

// Role tags as issued by the server
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";
pub const ROLE_CREATOR: &str = "ROLE_CREATOR";
pub const ROLE_USER: &str = "ROLE_USER";
pub const ROLE_PREFIX: &str = "ROLE_";

// View paths
pub const LANDING_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";
pub const RECOVER_PATH: &str = "/recover";
pub const RESET_PASSWORD_PATH: &str = "/reset-password";
pub const DASHBOARD_PATH: &str = "/dashboard";
pub const PROJECT_DETAIL_PATH: &str = "/projects/:id";
pub const USERS_PATH: &str = "/users";
pub const PROFILE_PATH: &str = "/profile";

// HTTP settings
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// Mirrors the server-side validation on project descriptions
pub const MAX_PROJECT_DESCRIPTION_CHARS: usize = 2000;

pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;
