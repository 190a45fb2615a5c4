//! Card creation endpoint.
//!
//! Parses and checks the submitted card. Storage is owned by another service;
//! this handler only answers whether the card is acceptable.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// A professional card as submitted by the create form.
#[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CardSpecs {
    pub full_name: String,
    pub job_title: String,
    pub location: String,
    pub bio: String,
    pub years_experience: String,
    pub email: String,
    pub phone: String,
    pub linkedin_profile: String,
    pub portfolio_website: String,
    pub skills: Vec<String>,
    pub experience: Vec<Experience>,
}

#[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Experience {
    pub job_title: String,
    pub company_name: String,
    pub start_date: String,
    pub end_date: String,
    pub is_current: bool,
}

impl CardSpecs {
    /// Trims every text field and drops blank skills.
    fn normalize(mut self) -> Self {
        for field in [
            &mut self.full_name,
            &mut self.job_title,
            &mut self.location,
            &mut self.bio,
            &mut self.years_experience,
            &mut self.email,
            &mut self.phone,
            &mut self.linkedin_profile,
            &mut self.portfolio_website,
        ] {
            *field = field.trim().to_owned();
        }
        self.skills = self.skills
            .into_iter()
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
        self
    }
}

/// `POST /api/v1/create`
///
/// - malformed JSON → `400` with the parser's message
/// - blank `fullName` → `422`
/// - otherwise → `201` with the normalised card echoed back
pub async fn create_card(req: Request) -> Response {
    let card: CardSpecs = match serde_json::from_slice(&req.into_body()) {
        Ok(card) => card,
        Err(e) => {
            debug!("rejecting card: {e}");
            return Response::builder()
                .status(Status::BadRequest)
                .text(format!("invalid card: {e}"));
        }
    };

    let card = card.normalize();
    if card.full_name.is_empty() {
        return Response::builder()
            .status(Status::UnprocessableContent)
            .text("fullName is required");
    }

    match serde_json::to_vec(&card) {
        Ok(body) => Response::builder().status(Status::Created).json(body),
        Err(_) => Response::status(Status::InternalServerError),
    }
}
