use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::AppError;
use crate::models::{Profile, ProfilePatch};
use crate::services::auth::hash_password;
use crate::services::store::{DatingStore, NewUser, ProfileStore, UserStore};

/// Password shared by every seeded account
pub const SEED_PASSWORD: &str = "12345678";

const FIRST_NAMES: &[&str] = &[
    "Alex", "Jordan", "Taylor", "Morgan", "Casey", "Riley", "Quinn", "Avery",
    "Blake", "Carter", "Dakota", "Emerson", "Finley", "Hayden", "Jade", "Kai",
    "Milo", "Nova", "River", "Sage", "Skyler", "Willow", "Luna", "Harper",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Brown", "Garcia", "Miller", "Davis", "Wilson", "Moore",
    "Clark", "Lewis", "Walker", "Young", "King", "Wright", "Scott", "Green",
];

const DESCRIPTIONS: &[&str] = &[
    "Weekend hiker, weekday coffee snob.",
    "Looking for someone to share bad puns with.",
    "Amateur cook, professional taster.",
    "Will trade travel stories for dessert recommendations.",
    "Bookshop regular and board game collector.",
    "Runs on sunshine and cold brew.",
    "Learning guitar, slowly.",
    "Dog person, open to cat negotiations.",
];

/// Insert `count` users, each with a filled-in profile, all sharing `password`
///
/// Emails carry a per-run tag so repeated runs never collide.
pub async fn seed_users(store: &dyn DatingStore, count: usize, password: &str) -> Result<Vec<Profile>, AppError> {
    let password_hash = hash_password(password)?;
    let mut rng = StdRng::from_entropy();
    let run: u32 = rng.gen();

    let mut profiles = Vec::with_capacity(count);
    for i in 0..count {
        let first = FIRST_NAMES.choose(&mut rng).copied().unwrap_or("Alex");
        let last = LAST_NAMES.choose(&mut rng).copied().unwrap_or("Smith");
        let description = DESCRIPTIONS.choose(&mut rng).copied().unwrap_or_default();

        let (user, profile) = store
            .create_user(NewUser {
                name: format!("{first} {last}"),
                email: format!("{}.{}.{run:08x}.{i}@example.com", first.to_lowercase(), last.to_lowercase()),
                password_hash: password_hash.clone(),
            })
            .await?;

        let patch = ProfilePatch {
            description: Some(description.to_string()),
            picture: Some(format!("https://picsum.photos/id/{}/200/300", i % 100)),
        };
        let profile = store.update_profile(profile.id, &patch).await?;

        tracing::debug!(user_id = user.id, profile_id = profile.id, "Seeded user");
        profiles.push(profile);
    }

    tracing::info!(count, "Seeded users");

    Ok(profiles)
}
