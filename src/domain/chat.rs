//! Oil-finder chat transcript.

use serde::Serialize;

use crate::catalog::{Catalog, Product};
use crate::i18n::{messages, Lang};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One transcript entry. `product_id` may name a catalog product; a
/// dangling id counts as "no recommendation" for every consumer.
#[derive(Clone, Debug, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
}

impl ChatMessage {
    /// The recommended product, if the id resolves in the catalog.
    pub fn recommended<'a>(&self, catalog: &'a Catalog) -> Option<&'a Product> {
        self.product_id.as_deref().and_then(|id| catalog.get(id))
    }
}

/// Append-only conversation transcript, seeded with the localized
/// greeting. Messages are never edited or removed.
#[derive(Clone, Debug)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new(lang: Lang) -> Self {
        Self {
            messages: vec![ChatMessage {
                role: Role::Assistant,
                text: messages::assistant_greeting(lang).to_string(),
                product_id: None,
            }],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage {
            role: Role::User,
            text: text.into(),
            product_id: None,
        });
    }

    pub fn push_assistant(&mut self, text: impl Into<String>, product_id: Option<String>) {
        self.messages.push(ChatMessage {
            role: Role::Assistant,
            text: text.into(),
            product_id,
        });
    }

    /// Re-localizes the greeting after a language switch, but only while
    /// the transcript holds nothing else yet.
    pub fn relocalize_greeting(&mut self, lang: Lang) {
        if let [only] = self.messages.as_mut_slice() {
            if only.role == Role::Assistant {
                only.text = messages::assistant_greeting(lang).to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn transcript_opens_with_the_localized_greeting() {
        let transcript = Transcript::new(Lang::Bn);
        assert_eq!(transcript.messages().len(), 1);
        assert_eq!(transcript.messages()[0].role, Role::Assistant);
        assert_eq!(
            transcript.messages()[0].text,
            messages::assistant_greeting(Lang::Bn)
        );
    }

    #[test]
    fn greeting_relocalizes_only_while_untouched() {
        let mut transcript = Transcript::new(Lang::En);
        transcript.relocalize_greeting(Lang::Bn);
        assert_eq!(
            transcript.messages()[0].text,
            messages::assistant_greeting(Lang::Bn)
        );

        transcript.push_user("Toyota Axio 2015");
        transcript.relocalize_greeting(Lang::En);
        assert_eq!(
            transcript.messages()[0].text,
            messages::assistant_greeting(Lang::Bn),
            "greeting must freeze once the conversation has started"
        );
    }

    #[test]
    fn messages_append_in_order() {
        let mut transcript = Transcript::new(Lang::En);
        transcript.push_user("Which oil for a Gixxer?");
        transcript.push_assistant("Try Xplore 10W-40 4T.", Some("xplore-10w40".into()));
        let roles: Vec<Role> = transcript.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, [Role::Assistant, Role::User, Role::Assistant]);
    }

    #[test]
    fn dangling_recommendation_resolves_to_none() {
        let catalog = Catalog::builtin().expect("embedded catalog parses");
        let mut transcript = Transcript::new(Lang::En);
        transcript.push_assistant("Try this.", Some("discontinued-oil".into()));
        transcript.push_assistant("Or this.", Some("xplore-10w40".into()));
        let messages = transcript.messages();
        assert!(messages[1].recommended(&catalog).is_none());
        assert_eq!(
            messages[2].recommended(&catalog).map(|p| p.id.as_str()),
            Some("xplore-10w40")
        );
    }
}
