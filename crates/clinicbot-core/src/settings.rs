// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The process-wide bot settings aggregate.
//!
//! Exactly one [`BotSettings`] document exists. It is read before every
//! dispatch decision and changed only through [`BotSettingsPatch`], which
//! replaces whole fields (last write wins).

use chrono::{Datelike, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ClinicError;
use crate::types::{Destination, LanguageCode, LocalizedText};

/// Bot behaviour settings edited from the admin panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotSettings {
    /// Master switch. When off, nothing is sent.
    pub active: bool,
    /// Reply automatically with welcome/offline messages.
    pub auto_responder: bool,
    pub welcome_message: LocalizedText,
    pub offline_message: LocalizedText,
    /// Language used when a contact's language is unknown or inactive.
    pub default_language: LanguageCode,
    pub working_hours: Vec<WorkingDay>,
    pub languages: Vec<LanguageSetting>,
    pub operators: Vec<Operator>,
    pub notifications: NotificationToggles,
}

/// Opening window for one weekday, as `HH:MM` local clinic time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingDay {
    pub day: Weekday,
    pub start: String,
    pub end: String,
    pub active: bool,
}

impl WorkingDay {
    fn new(day: Weekday, start: &str, end: &str, active: bool) -> Self {
        Self {
            day,
            start: start.to_string(),
            end: end.to_string(),
            active,
        }
    }

    /// Parsed `(start, end)` window.
    pub fn window(&self) -> Result<(NaiveTime, NaiveTime), ClinicError> {
        let parse = |s: &str| {
            NaiveTime::parse_from_str(s.trim(), "%H:%M").map_err(|_| {
                ClinicError::Validation(format!(
                    "working hours for {} must be HH:MM, got `{s}`",
                    self.day
                ))
            })
        };
        let (start, end) = (parse(&self.start)?, parse(&self.end)?);
        if start >= end {
            return Err(ClinicError::Validation(format!(
                "working hours for {} must start before they end ({} >= {})",
                self.day, self.start, self.end
            )));
        }
        Ok((start, end))
    }
}

/// Whether a language is offered to patients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSetting {
    pub code: LanguageCode,
    pub active: bool,
}

/// A staff member who receives bot notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    /// Chat id on the channel; preferred over `username` for delivery.
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub username: String,
    pub active: bool,
}

impl Operator {
    /// Where notifications for this operator go.
    pub fn destination(&self) -> Result<Destination, ClinicError> {
        if !self.id.trim().is_empty() {
            return self.id.parse();
        }
        let username = self.username.trim();
        if username.is_empty() {
            return Err(ClinicError::Validation(format!(
                "operator `{}` needs a chat id or a username",
                self.name
            )));
        }
        if username.starts_with('@') {
            username.parse()
        } else {
            format!("@{username}").parse()
        }
    }
}

/// Per-category notification switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationToggles {
    pub new_message: bool,
    pub new_contact: bool,
    pub new_appointment: bool,
    pub appointment_reminder: bool,
    pub daily_summary: bool,
}

impl Default for NotificationToggles {
    fn default() -> Self {
        Self {
            new_message: true,
            new_contact: true,
            new_appointment: true,
            appointment_reminder: true,
            daily_summary: true,
        }
    }
}

/// Which automatic reply to pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Greeting {
    Welcome,
    Offline,
}

impl Default for BotSettings {
    fn default() -> Self {
        use LanguageCode::{En, Ka, Ru, Tr};
        use Weekday::{Fri, Mon, Sat, Sun, Thu, Tue, Wed};

        Self {
            active: true,
            auto_responder: true,
            welcome_message: LocalizedText::from_pairs([
                (Tr, "Merhaba! Saç ekimi kliniğimize hoş geldiniz. Size nasıl yardımcı olabiliriz?"),
                (En, "Hello! Welcome to our hair transplant clinic. How can we help you?"),
                (Ru, "Здравствуйте! Добро пожаловать в нашу клинику по пересадке волос. Чем мы можем помочь?"),
                (Ka, "გამარჯობა! კეთილი იყოს თქვენი მობრძანება ჩვენს კლინიკაში. როგორ შეგვიძლია დაგეხმაროთ?"),
            ]),
            offline_message: LocalizedText::from_pairs([
                (Tr, "Şu anda mesai saatleri dışındayız. Mesajınızı aldık, en kısa sürede dönüş yapacağız."),
                (En, "We are currently outside working hours. We received your message and will get back to you soon."),
                (Ru, "Сейчас нерабочее время. Мы получили ваше сообщение и скоро ответим."),
                (Ka, "ამჟამად არასამუშაო საათებია. თქვენი შეტყობინება მივიღეთ და მალე გიპასუხებთ."),
            ]),
            default_language: Tr,
            working_hours: vec![
                WorkingDay::new(Mon, "09:00", "18:00", true),
                WorkingDay::new(Tue, "09:00", "18:00", true),
                WorkingDay::new(Wed, "09:00", "18:00", true),
                WorkingDay::new(Thu, "09:00", "18:00", true),
                WorkingDay::new(Fri, "09:00", "18:00", true),
                WorkingDay::new(Sat, "10:00", "14:00", true),
                WorkingDay::new(Sun, "10:00", "14:00", false),
            ],
            languages: LanguageCode::ALL
                .into_iter()
                .map(|code| LanguageSetting { code, active: true })
                .collect(),
            operators: Vec::new(),
            notifications: NotificationToggles::default(),
        }
    }
}

impl BotSettings {
    /// Checks working-hour windows and operator destinations.
    pub fn validate(&self) -> Result<(), ClinicError> {
        for day in &self.working_hours {
            day.window()?;
        }
        for operator in &self.operators {
            operator.destination()?;
        }
        Ok(())
    }

    /// True if the clinic is open at the given local time.
    ///
    /// Days without an entry, or with an inactive entry, are closed.
    pub fn is_working_time(&self, at: NaiveDateTime) -> bool {
        let weekday = at.weekday();
        let time = at.time();
        self.working_hours
            .iter()
            .filter(|d| d.active && d.day == weekday)
            .filter_map(|d| d.window().ok())
            .any(|(start, end)| start <= time && time < end)
    }

    /// True if `language` is listed and active.
    pub fn is_language_active(&self, language: LanguageCode) -> bool {
        self.languages
            .iter()
            .any(|l| l.code == language && l.active)
    }

    /// Picks the automatic reply text for a contact's language.
    ///
    /// Inactive languages fall back to `default_language`.
    pub fn greeting(&self, kind: Greeting, language: Option<LanguageCode>) -> Option<&str> {
        let language = language.filter(|l| self.is_language_active(*l));
        let text = match kind {
            Greeting::Welcome => &self.welcome_message,
            Greeting::Offline => &self.offline_message,
        };
        text.resolve(language, self.default_language)
    }

    /// Active operators in configured order.
    pub fn active_operators(&self) -> impl Iterator<Item = &Operator> {
        self.operators.iter().filter(|o| o.active)
    }
}

/// Partial settings update. Present fields replace the stored value wholesale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BotSettingsPatch {
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub auto_responder: Option<bool>,
    #[serde(default)]
    pub welcome_message: Option<LocalizedText>,
    #[serde(default)]
    pub offline_message: Option<LocalizedText>,
    #[serde(default)]
    pub default_language: Option<LanguageCode>,
    #[serde(default)]
    pub working_hours: Option<Vec<WorkingDay>>,
    #[serde(default)]
    pub languages: Option<Vec<LanguageSetting>>,
    #[serde(default)]
    pub operators: Option<Vec<Operator>>,
    #[serde(default)]
    pub notifications: Option<NotificationToggles>,
}

impl BotSettingsPatch {
    /// Patch that only flips the master switch.
    pub fn active(active: bool) -> Self {
        Self {
            active: Some(active),
            ..Self::default()
        }
    }

    /// Merges into `settings` and validates the result.
    ///
    /// `settings` is left untouched when validation fails.
    pub fn apply(self, settings: &mut BotSettings) -> Result<(), ClinicError> {
        let mut merged = settings.clone();
        if let Some(v) = self.active {
            merged.active = v;
        }
        if let Some(v) = self.auto_responder {
            merged.auto_responder = v;
        }
        if let Some(v) = self.welcome_message {
            merged.welcome_message = v;
        }
        if let Some(v) = self.offline_message {
            merged.offline_message = v;
        }
        if let Some(v) = self.default_language {
            merged.default_language = v;
        }
        if let Some(v) = self.working_hours {
            merged.working_hours = v;
        }
        if let Some(v) = self.languages {
            merged.languages = v;
        }
        if let Some(v) = self.operators {
            merged.operators = v;
        }
        if let Some(v) = self.notifications {
            merged.notifications = v;
        }
        merged.validate()?;
        *settings = merged;
        Ok(())
    }
}
