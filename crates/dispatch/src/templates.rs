//! Canned message bodies.

/// Subject of the connectivity test message.
pub const TEST_EMAIL_SUBJECT: &str = "🎉 Test Email - E-commerce Notification Service";

/// Related entity recorded on test messages so they can be told apart.
pub const TEST_ENTITY_TYPE: &str = "TEST";
pub const TEST_ENTITY_ID: &str = "test-001";

pub fn test_email_body(recipient_name: &str) -> String {
    format!(
        "Hello {recipient_name}!\n\
         \n\
         This is a TEST email from the E-commerce Notification Service.\n\
         \n\
         If you received this email, the notification system is working correctly!\n\
         \n\
         Best regards,\n\
         E-commerce Ecosystem Team\n"
    )
}
