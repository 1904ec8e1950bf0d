use rand::Rng;
use std::ops::RangeInclusive;

const FIRST_NAMES: &[&str] = &[
    "Aaliyah", "Aaron", "Abigail", "Adrian", "Aiden", "Alejandro", "Alice", "Amara", "Amelia",
    "Andre", "Aria", "Arjun", "Beatrice", "Benjamin", "Bianca", "Caleb", "Camila", "Carlos",
    "Chloe", "D'Andre", "D'Angelo", "Daniel", "Dante", "Elena", "Eli", "Emma", "Ethan", "Fatima",
    "Felix", "Gabriel", "Grace", "Hana", "Harper", "Hugo", "Ibrahim", "Isla", "Jack", "Jada",
    "Javier", "Keanu", "Kenji", "Layla", "Leo", "Liam", "Lucia", "Mateo", "Maya", "Mia", "Nadia",
    "Noah", "Olivia", "Omar", "Priya", "Quinn", "Rafael", "Ravi", "Rosa", "Sasha", "Sofia",
    "Tariq", "Theo", "Uma", "Victor", "Willa", "Xavier", "Yara", "Yusuf", "Zara", "Zoe",
];

// Synthetic data source: realistic first names and bounded integers.
// Holds no state; every call draws from the thread-local RNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct Faker;

impl Faker {
    pub fn first_name(&self) -> &'static str {
        let idx = rand::thread_rng().gen_range(0..FIRST_NAMES.len());
        FIRST_NAMES[idx]
    }

    pub fn int_in(&self, range: RangeInclusive<u8>) -> u8 {
        rand::thread_rng().gen_range(range)
    }
}
