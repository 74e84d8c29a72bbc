//! Caller locale selection
//!
//! Italian callers (+39) get Italian prompts, everyone else English.

/// Prompt language for a call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Locale {
    Italian,
    English,
}

impl Locale {
    /// Pick the locale from the caller's E.164 number
    pub fn for_caller(e164_from: Option<&str>) -> Self {
        match e164_from {
            Some(from) if from.trim().starts_with("+39") => Locale::Italian,
            _ => Locale::English,
        }
    }

    /// BCP 47 language tag used in TwiML `<Say>`
    pub fn tag(&self) -> &'static str {
        match self {
            Locale::Italian => "it-IT",
            Locale::English => "en-US",
        }
    }

    /// Greeting played while the call is being connected
    pub fn intro(&self) -> &'static str {
        match self {
            Locale::Italian => {
                "Benvenuto in Lobbi del tuo condominio. Sto verificando l'accesso."
            }
            Locale::English => "Welcome to your building Lobbi. Checking access.",
        }
    }

    /// Prompt played right before the media stream opens
    pub fn ready(&self) -> &'static str {
        match self {
            Locale::Italian => "Quando sei pronto, puoi iniziare a parlare.",
            Locale::English => "Okay, you can start talking.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_italian_prefix() {
        assert_eq!(Locale::for_caller(Some("+393331234567")), Locale::Italian);
        assert_eq!(Locale::for_caller(Some("  +39333 ")), Locale::Italian);
    }

    #[test]
    fn test_default_english() {
        assert_eq!(Locale::for_caller(Some("+14155550100")), Locale::English);
        assert_eq!(Locale::for_caller(Some("")), Locale::English);
        assert_eq!(Locale::for_caller(None), Locale::English);
    }

    #[test]
    fn test_tags() {
        assert_eq!(Locale::Italian.tag(), "it-IT");
        assert_eq!(Locale::English.tag(), "en-US");
    }
}
