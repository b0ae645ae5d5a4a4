use anyhow::{anyhow, Result};
use citypulse_core::config::Config;
use std::io::{BufRead, Write};

/// Asks for every credential. Firebase values are re-prompted until given;
/// the rest may be left blank.
pub fn ask_credentials<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    base: Config,
) -> Result<Config> {
    let mut config = base;

    writeln!(out, "CityPulse Setup Wizard")?;
    writeln!(out, "======================")?;
    writeln!(out)?;

    config.firebase.api_key = required(input, out, "Firebase API Key")?;
    config.firebase.auth_domain = required(input, out, "Firebase Auth Domain")?;
    config.firebase.project_id = required(input, out, "Firebase Project ID")?;
    config.firebase.storage_bucket = required(input, out, "Firebase Storage Bucket")?;
    config.firebase.messaging_sender_id = required(input, out, "Firebase Messaging Sender ID")?;
    config.firebase.app_id = required(input, out, "Firebase App ID")?;

    config.twilio.account_sid = optional(input, out, "Twilio Account SID")?;
    config.twilio.auth_token = optional(input, out, "Twilio Auth Token")?;
    config.twilio.whatsapp_number = optional(input, out, "Twilio WhatsApp Number")?;
    config.social.meta_access_token = optional(input, out, "Meta Graph API Access Token")?;
    config.social.instagram_page_id = optional(input, out, "Instagram Page ID")?;
    config.social.twitter_bearer_token = optional(input, out, "Twitter Bearer Token")?;

    Ok(config)
}

fn required<R: BufRead, W: Write>(input: &mut R, out: &mut W, label: &str) -> Result<String> {
    loop {
        write!(out, "Enter your {label}: ")?;
        out.flush()?;
        let answer = read_answer(input)?;
        if !answer.is_empty() {
            return Ok(answer);
        }
        writeln!(out, "This field is required. Please try again.")?;
        writeln!(out)?;
    }
}

fn optional<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    label: &str,
) -> Result<Option<String>> {
    write!(out, "Enter your {label} (optional): ")?;
    out.flush()?;
    let answer = read_answer(input)?;
    Ok(Some(answer).filter(|answer| !answer.is_empty()))
}

fn read_answer<R: BufRead>(input: &mut R) -> Result<String> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(anyhow!("setup aborted: input closed before all answers were given"));
    }
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn blank_required_answer_is_asked_again() {
        let answers = "\nkey\ndomain\nproject\nbucket\n123\napp\nAC1\n\n\n\n\nbearer\n";
        let mut out = Vec::new();
        let config =
            ask_credentials(&mut Cursor::new(answers), &mut out, Config::default()).unwrap();

        assert_eq!(config.firebase.api_key, "key");
        assert_eq!(config.firebase.app_id, "app");
        assert!(config.firebase.missing().is_empty());
        assert_eq!(config.twilio.account_sid.as_deref(), Some("AC1"));
        assert_eq!(config.twilio.auth_token, None);
        assert_eq!(config.social.twitter_bearer_token.as_deref(), Some("bearer"));

        let transcript = String::from_utf8(out).unwrap();
        assert_eq!(transcript.matches("Enter your Firebase API Key: ").count(), 2);
        assert!(transcript.contains("This field is required."));
    }

    #[test]
    fn closed_input_aborts() {
        let mut out = Vec::new();
        let err =
            ask_credentials(&mut Cursor::new("key\n"), &mut out, Config::default()).unwrap_err();
        assert!(err.to_string().contains("setup aborted"));
    }
}
