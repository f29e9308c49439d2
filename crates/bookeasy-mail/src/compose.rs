use crate::{MailAttachment, OutgoingMail};

pub fn confirmation(to: &str, public_url: &str, token: &str) -> OutgoingMail {
    let link = format!("{}/confirm?token={}", public_url.trim_end_matches('/'), token);
    OutgoingMail {
        to: to.to_string(),
        subject: "Registration confirmation".to_string(),
        body: format!("Hello!\n\nFollow the link to confirm your registration:\n{}", link),
        attachment: None,
    }
}

pub fn support_request(
    mailbox: &str,
    sender_email: &str,
    message: &str,
    attachment: Option<MailAttachment>,
) -> OutgoingMail {
    OutgoingMail {
        to: mailbox.to_string(),
        subject: "Support Request".to_string(),
        body: format!("Email: {}\nMessage: {}", sender_email, message),
        attachment,
    }
}
