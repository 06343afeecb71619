//! Application state management for petdesk.
//!
//! This module contains the `App` struct that plays the role of the page-level
//! views: login, registration, the dog list, the dog form, and the cats view.
//! Every protected screen runs the session gate on entry and redirects to the
//! login screen instead of calling the API when no credential is stored.

use std::sync::Arc;

use anyhow::Result;
use petdesk_core::auth::CredentialStore;
use petdesk_core::models::{
    AuthResponse, Dog, DogPatch, LoginRequest, NewDog, RegisterRequest, UserSummary,
};
use petdesk_core::{ApiClient, ApiError, Config, Gate, Session};
use tracing::{error, info, warn};

// ============================================================================
// Constants
// ============================================================================

/// Maximum length for email input (RFC 5321 path limit).
const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for name/breed input.
const MAX_TEXT_LENGTH: usize = 64;

/// Maximum number of digits for the age field.
const MAX_AGE_DIGITS: usize = 3;

/// Number of items to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

// ============================================================================
// UI State Types
// ============================================================================

/// The screen currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Register,
    Dogs,
    DogForm,
    Cats,
}

impl Screen {
    /// Protected screens require a stored credential.
    pub fn is_protected(&self) -> bool {
        matches!(self, Screen::Dogs | Screen::DogForm | Screen::Cats)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Screen::Login => "Sign in",
            Screen::Register => "Create account",
            Screen::Dogs => "Dogs",
            Screen::DogForm => "Dog",
            Screen::Cats => "Cats",
        }
    }
}

/// Overlay state on top of the current screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    ConfirmingDelete,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Email,
    Password,
    Submit,
    Register,
}

impl LoginFocus {
    pub fn next(&self) -> Self {
        match self {
            LoginFocus::Email => LoginFocus::Password,
            LoginFocus::Password => LoginFocus::Submit,
            LoginFocus::Submit => LoginFocus::Register,
            LoginFocus::Register => LoginFocus::Email,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            LoginFocus::Email => LoginFocus::Register,
            LoginFocus::Password => LoginFocus::Email,
            LoginFocus::Submit => LoginFocus::Password,
            LoginFocus::Register => LoginFocus::Submit,
        }
    }
}

/// Registration form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterFocus {
    Name,
    Email,
    Password,
    Submit,
    Back,
}

impl RegisterFocus {
    pub fn next(&self) -> Self {
        match self {
            RegisterFocus::Name => RegisterFocus::Email,
            RegisterFocus::Email => RegisterFocus::Password,
            RegisterFocus::Password => RegisterFocus::Submit,
            RegisterFocus::Submit => RegisterFocus::Back,
            RegisterFocus::Back => RegisterFocus::Name,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            RegisterFocus::Name => RegisterFocus::Back,
            RegisterFocus::Email => RegisterFocus::Name,
            RegisterFocus::Password => RegisterFocus::Email,
            RegisterFocus::Submit => RegisterFocus::Password,
            RegisterFocus::Back => RegisterFocus::Submit,
        }
    }
}

/// Dog form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Breed,
    Age,
    Active,
    Submit,
    Cancel,
}

impl FormField {
    pub fn next(&self) -> Self {
        match self {
            FormField::Name => FormField::Breed,
            FormField::Breed => FormField::Age,
            FormField::Age => FormField::Active,
            FormField::Active => FormField::Submit,
            FormField::Submit => FormField::Cancel,
            FormField::Cancel => FormField::Name,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            FormField::Name => FormField::Cancel,
            FormField::Breed => FormField::Name,
            FormField::Age => FormField::Breed,
            FormField::Active => FormField::Age,
            FormField::Submit => FormField::Active,
            FormField::Cancel => FormField::Submit,
        }
    }
}

/// Whether the dog form creates a new record or edits a loaded one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(Dog),
}

/// Editable dog form contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DogForm {
    pub mode: FormMode,
    pub name: String,
    pub breed: String,
    pub age: String,
    /// None until toggled when the loaded dog carried no flag.
    pub is_active: Option<bool>,
    pub focus: FormField,
    pub error: Option<String>,
}

impl DogForm {
    /// Empty form; new dogs start active.
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            name: String::new(),
            breed: String::new(),
            age: String::new(),
            is_active: Some(true),
            focus: FormField::Name,
            error: None,
        }
    }

    /// Form prefilled from a fetched dog.
    pub fn edit(dog: Dog) -> Self {
        Self {
            name: dog.name.clone(),
            breed: dog.breed.clone(),
            age: dog.age.map(|a| a.to_string()).unwrap_or_default(),
            is_active: dog.is_active,
            mode: FormMode::Edit(dog),
            focus: FormField::Name,
            error: None,
        }
    }

    /// Checkbox state. A missing flag shows as active.
    pub fn active(&self) -> bool {
        self.is_active.unwrap_or(true)
    }

    pub fn toggle_active(&mut self) {
        self.is_active = Some(!self.active());
    }

    pub fn heading(&self) -> String {
        match self.mode {
            FormMode::Create => "Add New Dog".to_string(),
            FormMode::Edit(ref dog) => format!("Edit {}", dog.name),
        }
    }

    /// Convert the form fields into a create payload.
    pub fn to_new_dog(&self) -> Result<NewDog, String> {
        let age = match self.age.trim() {
            "" => None,
            text => Some(
                text.parse::<u32>()
                    .map_err(|_| "Age must be a non-negative whole number".to_string())?,
            ),
        };
        let dog = NewDog {
            name: self.name.trim().to_string(),
            breed: self.breed.trim().to_string(),
            age,
            is_active: self.is_active,
        };
        dog.validate().map_err(|e| e.to_string())?;
        Ok(dog)
    }

    /// The text field under focus, if any.
    pub fn focused_text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Name => Some(&mut self.name),
            FormField::Breed => Some(&mut self.breed),
            FormField::Age => Some(&mut self.age),
            FormField::Active | FormField::Submit | FormField::Cancel => None,
        }
    }

    pub fn can_add_char(&self, c: char) -> bool {
        match self.focus {
            FormField::Name => can_add_text_char(self.name.chars().count(), c),
            FormField::Breed => can_add_text_char(self.breed.chars().count(), c),
            FormField::Age => can_add_age_char(self.age.len(), c),
            FormField::Active | FormField::Submit | FormField::Cancel => false,
        }
    }
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    // Core services
    pub config: Config,
    pub session: Session,
    pub api: ApiClient,
    persist_config: bool,

    // UI State
    pub screen: Screen,
    pub state: AppState,
    pub status_message: Option<String>,
    pub user: Option<UserSummary>,

    // Login form state
    pub login_email: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub auth_error: Option<String>,

    // Registration form state
    pub register_name: String,
    pub register_email: String,
    pub register_password: String,
    pub register_focus: RegisterFocus,

    // Dogs
    pub dogs: Vec<Dog>,
    pub dog_selection: usize,
    pub dogs_error: Option<String>,
    pub form: DogForm,

    // Cats
    pub cats: Option<String>,
    pub cats_error: Option<String>,
}

impl App {
    /// Build the app from the user's configuration and configured credential backend.
    pub fn new() -> Result<Self> {
        let config = Config::load()?;
        let store = config.open_credential_store()?;
        let mut app = Self::with_store(config, store)?;
        app.persist_config = true;
        Ok(app)
    }

    /// Build the app around an explicit credential store. Config changes are not saved.
    pub fn with_store(config: Config, store: Arc<dyn CredentialStore>) -> Result<Self> {
        let api = ApiClient::from_config(&config, Arc::clone(&store))?;
        let login_email = config.last_email.clone().unwrap_or_default();

        Ok(Self {
            session: Session::new(store),
            api,
            persist_config: false,
            screen: Screen::Login,
            state: AppState::Normal,
            status_message: None,
            user: None,
            login_email,
            login_password: String::new(),
            login_focus: LoginFocus::Email,
            auth_error: None,
            register_name: String::new(),
            register_email: String::new(),
            register_password: String::new(),
            register_focus: RegisterFocus::Name,
            dogs: Vec::new(),
            dog_selection: 0,
            dogs_error: None,
            form: DogForm::create(),
            cats: None,
            cats_error: None,
            config,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    // ===== Navigation =====

    /// Switch to the login screen.
    pub fn start_login(&mut self) {
        self.screen = Screen::Login;
        self.state = AppState::Normal;
        self.login_focus = if self.login_email.is_empty() {
            LoginFocus::Email
        } else {
            LoginFocus::Password
        };
        self.auth_error = None;
    }

    pub fn start_register(&mut self) {
        self.screen = Screen::Register;
        self.register_focus = RegisterFocus::Name;
        self.auth_error = None;
    }

    /// Run the session gate for a protected screen. Returns false after
    /// redirecting to login.
    fn enter_protected(&mut self) -> bool {
        match self.session.gate() {
            Gate::Proceed(_) => true,
            Gate::RedirectToLogin => {
                info!("No credential stored, redirecting to login");
                self.dogs.clear();
                self.cats = None;
                self.start_login();
                false
            }
        }
    }

    /// Show `screen`, loading its data. Protected screens redirect to login
    /// when no credential is stored.
    pub async fn navigate(&mut self, screen: Screen) {
        if screen.is_protected() && !self.enter_protected() {
            return;
        }
        self.state = AppState::Normal;
        match screen {
            Screen::Login => self.start_login(),
            Screen::Register => self.start_register(),
            Screen::Dogs => {
                self.screen = Screen::Dogs;
                self.refresh_dogs().await;
            }
            Screen::DogForm => self.open_create_form(),
            Screen::Cats => {
                self.screen = Screen::Cats;
                self.load_cats().await;
            }
        }
    }

    // ===== Authentication =====

    pub async fn attempt_login(&mut self) {
        let email = self.login_email.trim().to_string();
        if email.is_empty() || self.login_password.is_empty() {
            self.auth_error = Some("Email and password required".to_string());
            return;
        }
        self.auth_error = None;

        let request = LoginRequest::new(email.clone(), self.login_password.clone());
        match self.api.login(&request).await {
            Ok(auth) => self.finish_auth(&auth, email).await,
            Err(e) => {
                error!(error = %e, "Login failed");
                self.auth_error = Some(error_message(&e, "Login failed"));
            }
        }
    }

    pub async fn attempt_register(&mut self) {
        let email = self.register_email.trim().to_string();
        let request = RegisterRequest::new(
            email.clone(),
            self.register_password.clone(),
            Some(self.register_name.trim().to_string()),
        );
        self.auth_error = None;

        match self.api.register(&request).await {
            Ok(auth) => {
                self.register_password.clear();
                self.finish_auth(&auth, email).await;
            }
            Err(e) => {
                error!(error = %e, "Registration failed");
                self.auth_error = Some(error_message(&e, "Registration failed"));
            }
        }
    }

    async fn finish_auth(&mut self, auth: &AuthResponse, email: String) {
        let user = self.session.begin(auth).clone();
        info!(user_id = user.id, "Login successful");

        self.login_password.clear();
        self.login_email = email.clone();
        self.config.last_email = Some(email);
        self.save_config();

        self.status_message = Some(format!("Signed in as {}", user.display_name()));
        self.user = Some(user);
        self.navigate(Screen::Dogs).await;
    }

    pub fn logout(&mut self) {
        self.session.end();
        self.user = None;
        self.dogs.clear();
        self.dog_selection = 0;
        self.cats = None;
        self.status_message = Some("Signed out".to_string());
        self.start_login();
    }

    fn save_config(&self) {
        if !self.persist_config {
            return;
        }
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }

    // ===== Dogs =====

    pub async fn refresh_dogs(&mut self) {
        if !self.enter_protected() {
            return;
        }
        match self.api.list_dogs().await {
            Ok(dogs) => {
                self.dogs = dogs;
                self.dogs_error = None;
                self.clamp_selection();
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch dogs");
                self.dogs_error = Some(error_message(&e, "Failed to fetch dogs"));
            }
        }
    }

    pub fn selected_dog(&self) -> Option<&Dog> {
        self.dogs.get(self.dog_selection)
    }

    pub fn select_next(&mut self, step: usize) {
        if !self.dogs.is_empty() {
            self.dog_selection = (self.dog_selection + step).min(self.dogs.len() - 1);
        }
    }

    pub fn select_prev(&mut self, step: usize) {
        self.dog_selection = self.dog_selection.saturating_sub(step);
    }

    fn clamp_selection(&mut self) {
        self.dog_selection = self.dog_selection.min(self.dogs.len().saturating_sub(1));
    }

    pub fn open_create_form(&mut self) {
        if !self.enter_protected() {
            return;
        }
        self.form = DogForm::create();
        self.screen = Screen::DogForm;
    }

    /// Fetch the selected dog and open it in the form.
    pub async fn open_edit_form(&mut self) {
        if !self.enter_protected() {
            return;
        }
        let Some(id) = self.selected_dog().map(|d| d.id) else {
            return;
        };
        match self.api.get_dog(id).await {
            Ok(dog) => {
                self.form = DogForm::edit(dog);
                self.screen = Screen::DogForm;
            }
            Err(e) => {
                error!(error = %e, id, "Failed to fetch dog");
                self.dogs_error = Some(error_message(&e, "Failed to fetch dog"));
            }
        }
    }

    pub async fn submit_form(&mut self) {
        if !self.enter_protected() {
            return;
        }
        let edited = match self.form.to_new_dog() {
            Ok(dog) => dog,
            Err(message) => {
                self.form.error = Some(message);
                return;
            }
        };
        self.form.error = None;

        let result = match self.form.mode {
            FormMode::Create => self.api.create_dog(&edited).await.map(|dog| {
                format!("Added {}", dog.name)
            }),
            FormMode::Edit(ref current) => {
                let patch = DogPatch::from_changes(current, &edited);
                if patch.is_empty() {
                    Ok("No changes".to_string())
                } else {
                    self.api
                        .update_dog(current.id, &patch)
                        .await
                        .map(|dog| format!("Updated {}", dog.name))
                }
            }
        };

        match result {
            Ok(message) => {
                self.status_message = Some(message);
                self.navigate(Screen::Dogs).await;
            }
            Err(e) => {
                let fallback = match self.form.mode {
                    FormMode::Create => "Failed to create dog",
                    FormMode::Edit(_) => "Failed to update dog",
                };
                error!(error = %e, "{}", fallback);
                self.form.error = Some(error_message(&e, fallback));
            }
        }
    }

    pub fn cancel_form(&mut self) {
        self.form = DogForm::create();
        self.screen = Screen::Dogs;
    }

    /// Ask for confirmation before deleting the selected dog.
    pub fn request_delete(&mut self) {
        if self.selected_dog().is_some() {
            self.state = AppState::ConfirmingDelete;
        }
    }

    pub async fn confirm_delete(&mut self) {
        self.state = AppState::Normal;
        if !self.enter_protected() {
            return;
        }
        let Some((id, name)) = self.selected_dog().map(|d| (d.id, d.name.clone())) else {
            return;
        };
        match self.api.delete_dog(id).await {
            Ok(()) => {
                self.dogs.retain(|d| d.id != id);
                self.clamp_selection();
                self.status_message = Some(format!("Deleted {}", name));
            }
            Err(e) => {
                error!(error = %e, id, "Failed to delete dog");
                self.status_message = Some(error_message(&e, "Failed to delete dog"));
            }
        }
    }

    // ===== Cats =====

    pub async fn load_cats(&mut self) {
        if !self.enter_protected() {
            return;
        }
        match self.api.get_cats().await {
            Ok(text) => {
                self.cats = Some(text);
                self.cats_error = None;
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch cats");
                self.cats_error = Some(error_message(&e, "Failed to fetch cats"));
            }
        }
    }
}

/// Message to show for a failed operation: the server's text, or `fallback`
/// when there is nothing to show.
pub fn error_message(err: &ApiError, fallback: &str) -> String {
    let message = err.message();
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

// ============================================================================
// Input Validation
// ============================================================================

fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

pub fn can_add_email_char(current_len: usize, c: char) -> bool {
    current_len < MAX_EMAIL_LENGTH && is_valid_input_char(c) && !c.is_whitespace()
}

pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

pub fn can_add_text_char(current_len: usize, c: char) -> bool {
    current_len < MAX_TEXT_LENGTH && is_valid_input_char(c)
}

pub fn can_add_age_char(current_len: usize, c: char) -> bool {
    current_len < MAX_AGE_DIGITS && c.is_ascii_digit()
}
