//! Demo content fixture: one learning path with lessons and quizzes,
//! plus the nine scenario templates with their products and flavor
//! events. Installed by `bvkctl seed`; safe to run twice.

use tracing::info;

use crate::error::Result;
use crate::models::{
    AnswerOption, Difficulty, LearningPath, Lesson, Product, Question, Quiz, Scenario,
    ScenarioDifficulty, ScenarioEvent,
};
use crate::store::Store;

/// What a seed run actually installed
#[derive(Debug, Clone, Copy, Default)]
pub struct SeedReport {
    pub paths: usize,
    pub lessons: usize,
    pub quizzes: usize,
    pub scenarios: usize,
    pub products: usize,
    pub events: usize,
}

impl SeedReport {
    pub fn is_empty(&self) -> bool {
        self.paths == 0 && self.scenarios == 0
    }
}

struct LessonSeed {
    title: &'static str,
    description: &'static str,
    icon: &'static str,
    duration_min: i64,
    points: i64,
    coins: i64,
    requires_previous: bool,
    questions: &'static [QuestionSeed],
}

struct QuestionSeed {
    text: &'static str,
    /// Three options; the first is the correct one (shuffled by sort
    /// order below so the right answer is not always on top)
    options: [&'static str; 3],
    correct_position: i64,
}

struct ScenarioSeed {
    slug: &'static str,
    title: &'static str,
    description: &'static str,
    icon: &'static str,
    difficulty: ScenarioDifficulty,
    initial_budget_cents: i64,
    target_profit_cents: i64,
    duration_label: &'static str,
    age_range: &'static str,
    points_reward: i64,
    coins_reward: i64,
    products: &'static [ProductSeed],
    events: &'static [EventSeed],
}

struct ProductSeed {
    name: &'static str,
    icon: &'static str,
    unit_cost_cents: i64,
    suggested_price_cents: i64,
}

struct EventSeed {
    description: &'static str,
    icon: &'static str,
    weight: i64,
}

const DEMO_PATH_TITLE: &str = "Money Mastery Path";

const DEMO_LESSONS: &[LessonSeed] = &[
    LessonSeed {
        title: "Introduction to Money",
        description: "Learn the kinds of money, how we use it, and why it matters every day.",
        icon: "💰",
        duration_min: 30,
        points: 10,
        coins: 5,
        requires_previous: false,
        questions: &[
            QuestionSeed {
                text: "What do we use money for?",
                options: [
                    "Buying goods and services",
                    "Only for collecting",
                    "Nothing useful",
                ],
                correct_position: 1,
            },
            QuestionSeed {
                text: "Which of these is a form of money?",
                options: ["Coins and banknotes", "Leaves", "Clouds"],
                correct_position: 2,
            },
        ],
    },
    LessonSeed {
        title: "Saving vs Spending",
        description: "Explore the difference between saving and spending and smart ways to manage both.",
        icon: "💸",
        duration_min: 45,
        points: 15,
        coins: 8,
        requires_previous: true,
        questions: &[
            QuestionSeed {
                text: "What does saving money mean?",
                options: [
                    "Keeping money for the future",
                    "Spending it right away",
                    "Giving it all away",
                ],
                correct_position: 1,
            },
            QuestionSeed {
                text: "Why is it smart to save part of your allowance?",
                options: [
                    "So you can afford bigger goals later",
                    "Because money loses value in a piggy bank",
                    "So you never have fun",
                ],
                correct_position: 3,
            },
        ],
    },
    LessonSeed {
        title: "Budgeting Basics",
        description: "Build your first budget and learn to track income and expenses.",
        icon: "🛒",
        duration_min: 60,
        points: 20,
        coins: 10,
        requires_previous: true,
        questions: &[
            QuestionSeed {
                text: "What is a budget?",
                options: [
                    "A plan for how to spend your money",
                    "A kind of wallet",
                    "A tax on children",
                ],
                correct_position: 2,
            },
            QuestionSeed {
                text: "What should a budget compare?",
                options: ["Income and expenses", "Toys and games", "Friends and family"],
                correct_position: 1,
            },
        ],
    },
    LessonSeed {
        title: "Lemonade Stand Simulation",
        description: "Run a virtual lemonade stand and learn about costs, pricing and profit.",
        icon: "🍋",
        duration_min: 60,
        points: 25,
        coins: 15,
        requires_previous: true,
        questions: &[
            QuestionSeed {
                text: "If a cup costs 50 cents to make and sells for 1 dollar, the profit per cup is…",
                options: ["50 cents", "1 dollar", "Nothing"],
                correct_position: 2,
            },
            QuestionSeed {
                text: "What usually happens when you price far above what customers expect?",
                options: ["Fewer people buy", "Everyone buys more", "The price disappears"],
                correct_position: 1,
            },
        ],
    },
    LessonSeed {
        title: "Toy Store Tycoon",
        description: "Manage a toy store with multiple products, inventory and different customers.",
        icon: "🧸",
        duration_min: 90,
        points: 30,
        coins: 20,
        requires_previous: true,
        questions: &[
            QuestionSeed {
                text: "What is inventory?",
                options: [
                    "The stock of products you have to sell",
                    "The store's music playlist",
                    "A kind of discount",
                ],
                correct_position: 1,
            },
            QuestionSeed {
                text: "Why keep more than one product on the shelf?",
                options: [
                    "Different customers want different things",
                    "Shelves look sad when empty",
                    "It makes counting harder",
                ],
                correct_position: 2,
            },
        ],
    },
    LessonSeed {
        title: "Understanding Profit",
        description: "Learn to compute profit and the difference between revenue and expenses.",
        icon: "📊",
        duration_min: 45,
        points: 20,
        coins: 10,
        requires_previous: true,
        questions: &[
            QuestionSeed {
                text: "Profit equals…",
                options: [
                    "Revenue minus expenses",
                    "Revenue plus expenses",
                    "Expenses minus revenue",
                ],
                correct_position: 1,
            },
            QuestionSeed {
                text: "A stand earned 30 dollars and spent 12. The profit is…",
                options: ["18 dollars", "42 dollars", "12 dollars"],
                correct_position: 3,
            },
        ],
    },
    LessonSeed {
        title: "Introduction to Banking",
        description: "Learn about bank accounts, interest, and how banks help manage money.",
        icon: "💳",
        duration_min: 60,
        points: 25,
        coins: 15,
        requires_previous: true,
        questions: &[
            QuestionSeed {
                text: "What does a bank do with your savings account?",
                options: [
                    "Keeps the money safe and pays interest",
                    "Spends it on snacks",
                    "Hides it forever",
                ],
                correct_position: 2,
            },
            QuestionSeed {
                text: "Interest on savings is…",
                options: [
                    "Extra money the bank adds over time",
                    "A fee for being young",
                    "A kind of coin",
                ],
                correct_position: 1,
            },
        ],
    },
    LessonSeed {
        title: "Investing Basics",
        description: "Discover how investing can grow money over time.",
        icon: "📈",
        duration_min: 60,
        points: 30,
        coins: 18,
        requires_previous: true,
        questions: &[
            QuestionSeed {
                text: "Investing means…",
                options: [
                    "Putting money to work to earn more",
                    "Hiding money under the bed",
                    "Spending everything at once",
                ],
                correct_position: 1,
            },
            QuestionSeed {
                text: "Which is generally true about investments?",
                options: [
                    "They can grow but also carry risk",
                    "They always double overnight",
                    "They never change value",
                ],
                correct_position: 3,
            },
        ],
    },
];

const DEMO_SCENARIOS: &[ScenarioSeed] = &[
    ScenarioSeed {
        slug: "summer-lemonade-stand",
        title: "Summer Lemonade Stand",
        description: "Start your own lemonade stand and learn basic costs, pricing, supply and demand, and the profit formula.",
        icon: "🍋",
        difficulty: ScenarioDifficulty::Easy,
        initial_budget_cents: 5_000,
        target_profit_cents: 2_000,
        duration_label: "10-15",
        age_range: "8-12",
        points_reward: 100,
        coins_reward: 50,
        products: &[
            ProductSeed { name: "Classic Lemonade", icon: "🥤", unit_cost_cents: 40, suggested_price_cents: 100 },
            ProductSeed { name: "Mint Lemonade", icon: "🌿", unit_cost_cents: 60, suggested_price_cents: 150 },
        ],
        events: &[
            EventSeed { description: "A heat wave brings thirsty customers", icon: "☀️", weight: 3 },
            EventSeed { description: "A sudden rain shower scares the crowd away", icon: "🌧️", weight: 1 },
        ],
    },
    ScenarioSeed {
        slug: "toy-store-tycoon",
        title: "Toy Store Tycoon",
        description: "Run a colorful toy store and learn fixed vs variable costs, inventory and product mix.",
        icon: "🧸",
        difficulty: ScenarioDifficulty::Medium,
        initial_budget_cents: 20_000,
        target_profit_cents: 8_000,
        duration_label: "15-20",
        age_range: "10-14",
        points_reward: 150,
        coins_reward: 75,
        products: &[
            ProductSeed { name: "Teddy Bear", icon: "🧸", unit_cost_cents: 500, suggested_price_cents: 1_200 },
            ProductSeed { name: "Toy Car", icon: "🚗", unit_cost_cents: 300, suggested_price_cents: 700 },
            ProductSeed { name: "Puzzle Box", icon: "🧩", unit_cost_cents: 400, suggested_price_cents: 900 },
        ],
        events: &[
            EventSeed { description: "A birthday party crowd floods the store", icon: "🎈", weight: 2 },
            EventSeed { description: "A big chain store opens nearby", icon: "🏬", weight: 1 },
        ],
    },
    ScenarioSeed {
        slug: "busy-bakery-boss",
        title: "Busy Bakery Boss",
        description: "Manage a warm, delicious bakery and learn production planning and quality vs quantity.",
        icon: "🧁",
        difficulty: ScenarioDifficulty::Medium,
        initial_budget_cents: 15_000,
        target_profit_cents: 6_000,
        duration_label: "12-18",
        age_range: "9-13",
        points_reward: 130,
        coins_reward: 65,
        products: &[
            ProductSeed { name: "Cupcake", icon: "🧁", unit_cost_cents: 150, suggested_price_cents: 350 },
            ProductSeed { name: "Bread Loaf", icon: "🍞", unit_cost_cents: 200, suggested_price_cents: 450 },
            ProductSeed { name: "Croissant", icon: "🥐", unit_cost_cents: 120, suggested_price_cents: 300 },
        ],
        events: &[
            EventSeed { description: "The smell of fresh bread draws a line outside", icon: "🥖", weight: 3 },
            EventSeed { description: "The oven needs a quick repair", icon: "🔧", weight: 1 },
        ],
    },
    ScenarioSeed {
        slug: "farm-fresh-stand",
        title: "Farm Fresh Stand",
        description: "Run a farm stand and learn opportunity cost, seasonal demand and managing risk.",
        icon: "🌾",
        difficulty: ScenarioDifficulty::Hard,
        initial_budget_cents: 10_000,
        target_profit_cents: 5_000,
        duration_label: "20-25",
        age_range: "11-15",
        points_reward: 180,
        coins_reward: 90,
        products: &[
            ProductSeed { name: "Tomato Basket", icon: "🍅", unit_cost_cents: 200, suggested_price_cents: 450 },
            ProductSeed { name: "Egg Carton", icon: "🥚", unit_cost_cents: 250, suggested_price_cents: 550 },
            ProductSeed { name: "Honey Jar", icon: "🍯", unit_cost_cents: 600, suggested_price_cents: 1_400 },
        ],
        events: &[
            EventSeed { description: "Farmers market day doubles foot traffic", icon: "🧺", weight: 2 },
            EventSeed { description: "A late frost worries the growers", icon: "🥶", weight: 1 },
        ],
    },
    ScenarioSeed {
        slug: "mobile-car-wash",
        title: "Mobile Car Wash",
        description: "Offer a professional car wash service and learn service pricing and repeat business.",
        icon: "🚗",
        difficulty: ScenarioDifficulty::Medium,
        initial_budget_cents: 8_000,
        target_profit_cents: 3_200,
        duration_label: "15-18",
        age_range: "10-14",
        points_reward: 120,
        coins_reward: 60,
        products: &[
            ProductSeed { name: "Basic Wash", icon: "🚿", unit_cost_cents: 150, suggested_price_cents: 500 },
            ProductSeed { name: "Deluxe Wash", icon: "✨", unit_cost_cents: 400, suggested_price_cents: 1_200 },
        ],
        events: &[
            EventSeed { description: "A dust storm leaves every car dirty", icon: "🌪️", weight: 2 },
            EventSeed { description: "A free city car wash opens for the day", icon: "🚰", weight: 1 },
        ],
    },
    ScenarioSeed {
        slug: "pet-sitting-service",
        title: "Pet Sitting Service",
        description: "Care for wonderful pets and learn time management and building a reputation.",
        icon: "🐾",
        difficulty: ScenarioDifficulty::Easy,
        initial_budget_cents: 4_000,
        target_profit_cents: 1_600,
        duration_label: "12-15",
        age_range: "9-13",
        points_reward: 90,
        coins_reward: 45,
        products: &[
            ProductSeed { name: "Dog Walk", icon: "🐕", unit_cost_cents: 100, suggested_price_cents: 400 },
            ProductSeed { name: "Cat Visit", icon: "🐈", unit_cost_cents: 80, suggested_price_cents: 350 },
        ],
        events: &[
            EventSeed { description: "A holiday weekend books every slot", icon: "🏖️", weight: 2 },
            EventSeed { description: "A client cancels at the last minute", icon: "📵", weight: 1 },
        ],
    },
    ScenarioSeed {
        slug: "school-supplies-store",
        title: "School Supplies Store",
        description: "Run an organized supplies store and learn seasonal demand, bulk buying and timing.",
        icon: "📚",
        difficulty: ScenarioDifficulty::Medium,
        initial_budget_cents: 30_000,
        target_profit_cents: 12_000,
        duration_label: "18-22",
        age_range: "10-14",
        points_reward: 160,
        coins_reward: 80,
        products: &[
            ProductSeed { name: "Notebook", icon: "📓", unit_cost_cents: 120, suggested_price_cents: 250 },
            ProductSeed { name: "Pen Pack", icon: "🖊️", unit_cost_cents: 180, suggested_price_cents: 400 },
            ProductSeed { name: "Backpack", icon: "🎒", unit_cost_cents: 1_500, suggested_price_cents: 3_000 },
        ],
        events: &[
            EventSeed { description: "Back-to-school week begins", icon: "🏫", weight: 3 },
            EventSeed { description: "A supplier ships the wrong boxes", icon: "📦", weight: 1 },
        ],
    },
    ScenarioSeed {
        slug: "handmade-crafts-online-store",
        title: "Handmade Crafts Online Store",
        description: "Start a creative online shop and learn the value of labor, reviews and scaling limits.",
        icon: "🎨",
        difficulty: ScenarioDifficulty::Hard,
        initial_budget_cents: 10_000,
        target_profit_cents: 5_000,
        duration_label: "20-25",
        age_range: "12-15",
        points_reward: 200,
        coins_reward: 100,
        products: &[
            ProductSeed { name: "Friendship Bracelet", icon: "📿", unit_cost_cents: 80, suggested_price_cents: 250 },
            ProductSeed { name: "Painted Mug", icon: "🎨", unit_cost_cents: 300, suggested_price_cents: 800 },
        ],
        events: &[
            EventSeed { description: "A craft fair features your shop", icon: "🎪", weight: 2 },
            EventSeed { description: "Shipping prices go up", icon: "📮", weight: 1 },
        ],
    },
    ScenarioSeed {
        slug: "snow-removal-service",
        title: "Snow Removal Service",
        description: "Run a winter snow service and learn weather-dependent business and capacity limits.",
        icon: "❄️",
        difficulty: ScenarioDifficulty::Hard,
        initial_budget_cents: 12_000,
        target_profit_cents: 6_000,
        duration_label: "18-22",
        age_range: "12-15",
        points_reward: 170,
        coins_reward: 85,
        products: &[
            ProductSeed { name: "Driveway Clear", icon: "❄️", unit_cost_cents: 200, suggested_price_cents: 800 },
            ProductSeed { name: "Sidewalk Salting", icon: "🧂", unit_cost_cents: 150, suggested_price_cents: 450 },
        ],
        events: &[
            EventSeed { description: "Overnight snowfall buries the street", icon: "🌨️", weight: 3 },
            EventSeed { description: "A warm spell melts everything", icon: "🌤️", weight: 1 },
        ],
    },
];

/// Install the demo fixture. Existing content (matched by path title
/// and scenario slug) is left alone, so reruns only fill gaps.
pub fn install_demo_content(store: &Store) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    let have_path = store
        .list_paths()?
        .iter()
        .any(|p| p.title == DEMO_PATH_TITLE);
    if !have_path {
        install_demo_path(store, &mut report)?;
    }

    for (i, seed) in DEMO_SCENARIOS.iter().enumerate() {
        if store.get_scenario_by_slug(seed.slug)?.is_some() {
            continue;
        }
        install_scenario(store, seed, (i + 1) as i64, &mut report)?;
    }

    info!(
        paths = report.paths,
        lessons = report.lessons,
        scenarios = report.scenarios,
        "demo content installed"
    );
    Ok(report)
}

fn install_demo_path(store: &Store, report: &mut SeedReport) -> Result<()> {
    let total_duration: i64 = DEMO_LESSONS.iter().map(|l| l.duration_min).sum();
    let path_id = store.create_path(&LearningPath {
        id: 0,
        title: DEMO_PATH_TITLE.to_string(),
        description: "Master the basics of money management, from simple saving to business \
                      strategy. Complete every lesson to earn your Money Master certificate!"
            .to_string(),
        icon: "💰".to_string(),
        difficulty: Difficulty::Intermediate,
        min_age: 10,
        max_age: 14,
        total_duration_min: total_duration,
        certificate_available: true,
        sort_order: 1,
        is_active: true,
    })?;
    report.paths += 1;

    for (i, seed) in DEMO_LESSONS.iter().enumerate() {
        let order = (i + 1) as i64;
        let lesson_id = store.create_lesson(&Lesson {
            id: 0,
            path_id,
            title: seed.title.to_string(),
            description: seed.description.to_string(),
            icon: seed.icon.to_string(),
            duration_min: seed.duration_min,
            sort_order: order,
            content: format!("{} {}", seed.icon, seed.description),
            points: seed.points,
            coins: seed.coins,
            requires_previous: seed.requires_previous,
            is_active: true,
        })?;
        report.lessons += 1;

        let quiz_id = store.create_quiz(&Quiz {
            id: 0,
            lesson_id,
            title: format!("Quiz: {}", seed.title),
            description: format!("Test what you learned in {}", seed.title),
            pass_percentage: 70,
            is_active: true,
        })?;
        report.quizzes += 1;

        for (qi, question) in seed.questions.iter().enumerate() {
            let question_id = store.create_question(&Question {
                id: 0,
                quiz_id,
                text: question.text.to_string(),
                points: 1,
                sort_order: (qi + 1) as i64,
                explanation: String::new(),
            })?;
            for (oi, text) in question.options.iter().enumerate() {
                // First listed option is correct; correct_position only
                // moves where it sorts in the form
                let sort_order = if oi == 0 {
                    question.correct_position
                } else if (oi as i64) < question.correct_position {
                    oi as i64
                } else {
                    (oi + 1) as i64
                };
                store.create_answer_option(&AnswerOption {
                    id: 0,
                    question_id,
                    text: text.to_string(),
                    is_correct: oi == 0,
                    sort_order,
                })?;
            }
        }
    }
    Ok(())
}

fn install_scenario(
    store: &Store,
    seed: &ScenarioSeed,
    sort_order: i64,
    report: &mut SeedReport,
) -> Result<()> {
    let scenario_id = store.create_scenario(&Scenario {
        id: 0,
        slug: seed.slug.to_string(),
        title: seed.title.to_string(),
        description: seed.description.to_string(),
        icon: seed.icon.to_string(),
        difficulty: seed.difficulty,
        initial_budget_cents: seed.initial_budget_cents,
        target_profit_cents: seed.target_profit_cents,
        duration_label: seed.duration_label.to_string(),
        age_range: seed.age_range.to_string(),
        points_reward: seed.points_reward,
        coins_reward: seed.coins_reward,
        sort_order,
        is_active: true,
    })?;
    report.scenarios += 1;

    for product in seed.products {
        store.create_product(&Product {
            id: 0,
            scenario_id,
            name: product.name.to_string(),
            icon: product.icon.to_string(),
            unit_cost_cents: product.unit_cost_cents,
            suggested_price_cents: product.suggested_price_cents,
        })?;
        report.products += 1;
    }
    for event in seed.events {
        store.create_scenario_event(&ScenarioEvent {
            id: 0,
            scenario_id,
            description: event.description.to_string(),
            icon: event.icon.to_string(),
            weight: event.weight,
        })?;
        report.events += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_store() -> (Store, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let store = Store::open(&path).unwrap();
        (store, dir)
    }

    #[test]
    fn test_install_demo_content() {
        let (store, _dir) = test_store();
        let report = install_demo_content(&store).unwrap();
        assert_eq!(report.paths, 1);
        assert_eq!(report.lessons, 8);
        assert_eq!(report.quizzes, 8);
        assert_eq!(report.scenarios, 9);
        assert!(report.products >= 18);
        assert!(report.events >= 18);

        let paths = store.list_paths().unwrap();
        assert_eq!(paths.len(), 1);
        let scenarios = store.list_scenarios().unwrap();
        assert_eq!(scenarios.len(), 9);
        assert_eq!(scenarios[0].slug, "summer-lemonade-stand");
    }

    #[test]
    fn test_seed_is_idempotent() {
        let (store, _dir) = test_store();
        install_demo_content(&store).unwrap();
        let rerun = install_demo_content(&store).unwrap();
        assert!(rerun.is_empty());
        assert_eq!(store.list_scenarios().unwrap().len(), 9);
        assert_eq!(store.list_paths().unwrap().len(), 1);
    }

    #[test]
    fn test_every_quiz_has_a_correct_answer() {
        let (store, _dir) = test_store();
        install_demo_content(&store).unwrap();

        let path = &store.list_paths().unwrap()[0];
        let overview = store.path_overview(1, path.id).unwrap();
        for view in &overview.lessons {
            let form = store.quiz_for_lesson(view.lesson.id).unwrap().unwrap();
            assert!(!form.questions.is_empty());
            for q in &form.questions {
                assert_eq!(q.options.len(), 3);
                assert_eq!(q.options.iter().filter(|o| o.is_correct).count(), 1);
            }
        }
    }

    #[test]
    fn test_scenarios_are_playable() {
        let (store, _dir) = test_store();
        install_demo_content(&store).unwrap();

        for scenario in store.list_scenarios().unwrap() {
            let products = store.products_of(scenario.id).unwrap();
            assert!(!products.is_empty(), "{} has no products", scenario.slug);
            for p in &products {
                assert!(p.unit_cost_cents > 0);
                assert!(p.suggested_price_cents > p.unit_cost_cents);
            }
            assert!(scenario.initial_budget_cents > 0);
            assert!(scenario.target_profit_cents > 0);
        }
    }
}
