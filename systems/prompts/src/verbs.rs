//! Spanish verb conjugation prompts.

use std::collections::HashMap;

use quiz_defence_core::{Prompt, Tier, Validation};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{accents, PromptError, PromptGenerator};

/// High-frequency verbs drawn for prompts: ten irregular, then ten regular.
pub const VERBS: [&str; 20] = [
    "ser", "estar", "tener", "hacer", "ir", "poder", "decir", "ver", "dar", "saber", "hablar",
    "trabajar", "estudiar", "comer", "beber", "leer", "vivir", "escribir", "abrir", "recibir",
];

/// Grammatical person of the subject.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Person {
    /// `yo`.
    FirstSingular,
    /// `tú`.
    SecondSingular,
    /// `él`.
    ThirdSingular,
    /// `nosotros`.
    FirstPlural,
    /// `vosotros`.
    SecondPlural,
    /// `ellos`.
    ThirdPlural,
}

impl Person {
    /// Every person in conjugation-table order.
    pub const ALL: [Person; 6] = [
        Person::FirstSingular,
        Person::SecondSingular,
        Person::ThirdSingular,
        Person::FirstPlural,
        Person::SecondPlural,
        Person::ThirdPlural,
    ];

    /// Subject pronoun shown in the prompt.
    #[must_use]
    pub const fn pronoun(self) -> &'static str {
        match self {
            Self::FirstSingular => "yo",
            Self::SecondSingular => "tú",
            Self::ThirdSingular => "él",
            Self::FirstPlural => "nosotros",
            Self::SecondPlural => "vosotros",
            Self::ThirdPlural => "ellos",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Tense asked for by a prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tense {
    /// Present indicative.
    Present,
    /// Preterite indicative.
    Preterite,
    /// Imperfect indicative.
    Imperfect,
    /// Future indicative.
    Future,
    /// Conditional.
    Conditional,
    /// Present subjunctive.
    PresentSubjunctive,
    /// Imperfect subjunctive, `-ra` form.
    ImperfectSubjunctive,
}

impl Tense {
    /// Name shown in the prompt.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Preterite => "preterite",
            Self::Imperfect => "imperfect",
            Self::Future => "future",
            Self::Conditional => "conditional",
            Self::PresentSubjunctive => "subjunctive present",
            Self::ImperfectSubjunctive => "subjunctive imperfect",
        }
    }

    /// Tenses drawn uniformly for a tier.
    ///
    /// Hard prompts are half subjunctive, a quarter future and a quarter
    /// conditional.
    #[must_use]
    pub const fn for_tier(tier: Tier) -> &'static [Tense] {
        match tier {
            Tier::Easy => &[Tense::Present],
            Tier::Medium => &[Tense::Preterite, Tense::Imperfect],
            Tier::Hard | Tier::Cluster => &[
                Tense::PresentSubjunctive,
                Tense::ImperfectSubjunctive,
                Tense::Future,
                Tense::Conditional,
            ],
        }
    }
}

type Forms = [&'static str; 6];

const IRREGULAR: &[(&str, Tense, Forms)] = &[
    ("ser", Tense::Present, ["soy", "eres", "es", "somos", "sois", "son"]),
    ("estar", Tense::Present, ["estoy", "estás", "está", "estamos", "estáis", "están"]),
    ("tener", Tense::Present, ["tengo", "tienes", "tiene", "tenemos", "tenéis", "tienen"]),
    ("hacer", Tense::Present, ["hago", "haces", "hace", "hacemos", "hacéis", "hacen"]),
    ("ir", Tense::Present, ["voy", "vas", "va", "vamos", "vais", "van"]),
    ("poder", Tense::Present, ["puedo", "puedes", "puede", "podemos", "podéis", "pueden"]),
    ("decir", Tense::Present, ["digo", "dices", "dice", "decimos", "decís", "dicen"]),
    ("ver", Tense::Present, ["veo", "ves", "ve", "vemos", "veis", "ven"]),
    ("dar", Tense::Present, ["doy", "das", "da", "damos", "dais", "dan"]),
    ("saber", Tense::Present, ["sé", "sabes", "sabe", "sabemos", "sabéis", "saben"]),
    ("ser", Tense::Preterite, ["fui", "fuiste", "fue", "fuimos", "fuisteis", "fueron"]),
    ("ir", Tense::Preterite, ["fui", "fuiste", "fue", "fuimos", "fuisteis", "fueron"]),
    ("estar", Tense::Preterite, ["estuve", "estuviste", "estuvo", "estuvimos", "estuvisteis", "estuvieron"]),
    ("tener", Tense::Preterite, ["tuve", "tuviste", "tuvo", "tuvimos", "tuvisteis", "tuvieron"]),
    ("hacer", Tense::Preterite, ["hice", "hiciste", "hizo", "hicimos", "hicisteis", "hicieron"]),
    ("poder", Tense::Preterite, ["pude", "pudiste", "pudo", "pudimos", "pudisteis", "pudieron"]),
    ("decir", Tense::Preterite, ["dije", "dijiste", "dijo", "dijimos", "dijisteis", "dijeron"]),
    ("ver", Tense::Preterite, ["vi", "viste", "vio", "vimos", "visteis", "vieron"]),
    ("dar", Tense::Preterite, ["di", "diste", "dio", "dimos", "disteis", "dieron"]),
    ("saber", Tense::Preterite, ["supe", "supiste", "supo", "supimos", "supisteis", "supieron"]),
    ("leer", Tense::Preterite, ["leí", "leíste", "leyó", "leímos", "leísteis", "leyeron"]),
    ("ser", Tense::Imperfect, ["era", "eras", "era", "éramos", "erais", "eran"]),
    ("ir", Tense::Imperfect, ["iba", "ibas", "iba", "íbamos", "ibais", "iban"]),
    ("ver", Tense::Imperfect, ["veía", "veías", "veía", "veíamos", "veíais", "veían"]),
    ("ser", Tense::PresentSubjunctive, ["sea", "seas", "sea", "seamos", "seáis", "sean"]),
    ("estar", Tense::PresentSubjunctive, ["esté", "estés", "esté", "estemos", "estéis", "estén"]),
    ("tener", Tense::PresentSubjunctive, ["tenga", "tengas", "tenga", "tengamos", "tengáis", "tengan"]),
    ("hacer", Tense::PresentSubjunctive, ["haga", "hagas", "haga", "hagamos", "hagáis", "hagan"]),
    ("ir", Tense::PresentSubjunctive, ["vaya", "vayas", "vaya", "vayamos", "vayáis", "vayan"]),
    ("poder", Tense::PresentSubjunctive, ["pueda", "puedas", "pueda", "podamos", "podáis", "puedan"]),
    ("decir", Tense::PresentSubjunctive, ["diga", "digas", "diga", "digamos", "digáis", "digan"]),
    ("ver", Tense::PresentSubjunctive, ["vea", "veas", "vea", "veamos", "veáis", "vean"]),
    ("dar", Tense::PresentSubjunctive, ["dé", "des", "dé", "demos", "deis", "den"]),
    ("saber", Tense::PresentSubjunctive, ["sepa", "sepas", "sepa", "sepamos", "sepáis", "sepan"]),
];

const FUTURE_STEMS: &[(&str, &str)] = &[
    ("tener", "tendr"),
    ("hacer", "har"),
    ("poder", "podr"),
    ("decir", "dir"),
    ("saber", "sabr"),
];

const FUTURE_ENDINGS: Forms = ["é", "ás", "á", "emos", "éis", "án"];
const CONDITIONAL_ENDINGS: Forms = ["ía", "ías", "ía", "íamos", "íais", "ían"];

fn regular_endings(class: &str, tense: Tense) -> Option<Forms> {
    let endings = match (class, tense) {
        ("ar", Tense::Present) => ["o", "as", "a", "amos", "áis", "an"],
        ("er", Tense::Present) => ["o", "es", "e", "emos", "éis", "en"],
        ("ir", Tense::Present) => ["o", "es", "e", "imos", "ís", "en"],
        ("ar", Tense::Preterite) => ["é", "aste", "ó", "amos", "asteis", "aron"],
        ("er" | "ir", Tense::Preterite) => ["í", "iste", "ió", "imos", "isteis", "ieron"],
        ("ar", Tense::Imperfect) => ["aba", "abas", "aba", "ábamos", "abais", "aban"],
        ("er" | "ir", Tense::Imperfect) => CONDITIONAL_ENDINGS,
        ("ar", Tense::PresentSubjunctive) => ["e", "es", "e", "emos", "éis", "en"],
        ("er" | "ir", Tense::PresentSubjunctive) => ["a", "as", "a", "amos", "áis", "an"],
        _ => return None,
    };
    Some(endings)
}

/// Accents the final vowel of an imperfect subjunctive stem (`habla` to `hablá`).
fn stressed(stem: &str) -> Option<String> {
    let mut chars: Vec<char> = stem.chars().collect();
    let last = chars.last_mut()?;
    *last = match *last {
        'a' => 'á',
        'e' => 'é',
        _ => return None,
    };
    Some(chars.into_iter().collect())
}

/// Conjugates `infinitive`, or returns `None` for verbs the tables cannot handle.
#[must_use]
pub fn conjugate(infinitive: &str, tense: Tense, person: Person) -> Option<String> {
    if let Some((_, _, forms)) = IRREGULAR
        .iter()
        .find(|(verb, irregular_tense, _)| *verb == infinitive && *irregular_tense == tense)
    {
        return Some(forms[person.index()].to_owned());
    }

    match tense {
        Tense::Future | Tense::Conditional => {
            if !["ar", "er", "ir"].iter().any(|class| infinitive.ends_with(class)) {
                return None;
            }
            let stem = FUTURE_STEMS
                .iter()
                .find(|(verb, _)| *verb == infinitive)
                .map_or(infinitive, |(_, stem)| *stem);
            let endings = if tense == Tense::Future {
                FUTURE_ENDINGS
            } else {
                CONDITIONAL_ENDINGS
            };
            Some(format!("{stem}{}", endings[person.index()]))
        }
        Tense::ImperfectSubjunctive => {
            let preterite = conjugate(infinitive, Tense::Preterite, Person::ThirdPlural)?;
            let stem = preterite.strip_suffix("ron")?;
            if person == Person::FirstPlural {
                Some(format!("{}ramos", stressed(stem)?))
            } else {
                let endings = ["ra", "ras", "ra", "ramos", "rais", "ran"];
                Some(format!("{stem}{}", endings[person.index()]))
            }
        }
        Tense::Present | Tense::Preterite | Tense::Imperfect | Tense::PresentSubjunctive => {
            let split = infinitive.len().checked_sub(2)?;
            let (stem, class) = (infinitive.get(..split)?, infinitive.get(split..)?);
            if stem.is_empty() {
                return None;
            }
            let endings = regular_endings(class, tense)?;
            Some(format!("{stem}{}", endings[person.index()]))
        }
    }
}

/// Generates conjugation prompts no harder than the player's base tier.
#[derive(Debug)]
pub struct VerbGenerator {
    base: Tier,
    verbs: Vec<&'static str>,
    cache: HashMap<(&'static str, Tense, Person), String>,
    rng: ChaCha8Rng,
}

impl VerbGenerator {
    /// Creates a generator drawing from [`VERBS`].
    #[must_use]
    pub fn new(base: Tier, seed: u64) -> Self {
        Self::with_verbs(base, VERBS.to_vec(), seed)
    }

    /// Creates a generator drawing from a custom verb list.
    #[must_use]
    pub fn with_verbs(base: Tier, verbs: Vec<&'static str>, seed: u64) -> Self {
        Self {
            base,
            verbs,
            cache: HashMap::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Base tier chosen by the player.
    #[must_use]
    pub const fn base(&self) -> Tier {
        self.base
    }

    fn conjugation(&mut self, infinitive: &'static str, tense: Tense, person: Person) -> String {
        self.cache
            .entry((infinitive, tense, person))
            .or_insert_with(|| {
                conjugate(infinitive, tense, person).unwrap_or_else(|| {
                    log::warn!(
                        "no {} conjugation for {infinitive}, using the infinitive",
                        tense.label()
                    );
                    infinitive.to_owned()
                })
            })
            .clone()
    }
}

impl PromptGenerator for VerbGenerator {
    fn try_generate(&mut self, tier: Tier) -> Result<Prompt, PromptError> {
        let tier = tier.clamp_to(self.base);
        let infinitive = *self.verbs.choose(&mut self.rng).ok_or(PromptError::EmptySource)?;
        let person = Person::ALL[self.rng.gen_range(0..Person::ALL.len())];
        let tenses = Tense::for_tier(tier);
        let tense = tenses[self.rng.gen_range(0..tenses.len())];

        let answer = self.conjugation(infinitive, tense, person);
        let text = format!("{infinitive} ({}, {})", person.pronoun(), tense.label());
        Ok(Prompt::with_answer(text, answer))
    }

    fn validate(&self, prompt: &Prompt, input: &str) -> Validation {
        let correct_form = prompt.primary_answer();
        let Some(matched) = prompt
            .correct_answers()
            .iter()
            .find(|answer| accents::compare_ignoring_accents(input, answer))
        else {
            return Validation::incorrect(correct_form);
        };
        Validation {
            is_correct: true,
            bonus_points: accents::accent_bonus(input, matched),
            correct_form: correct_form.to_owned(),
        }
    }
}
