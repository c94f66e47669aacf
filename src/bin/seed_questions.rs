//! Replaces the question store content with the starter topical set and
//! makes sure a demo user exists. Run with DATABASE_URL configured.

use learnsphere_backend_rust::db::operations::{questions, users};
use learnsphere_backend_rust::db::DatabaseProxy;
use learnsphere_backend_rust::services::difficulty::Difficulty;

struct SeedQuestion {
    topic: &'static str,
    difficulty: Difficulty,
    question_text: &'static str,
    options: [&'static str; 4],
    correct_answer: &'static str,
}

const SEED_QUESTIONS: &[SeedQuestion] = &[
    SeedQuestion {
        topic: "loops",
        difficulty: Difficulty::Easy,
        question_text: "What is the output of: for(i=0;i<3;i++) console.log(i);",
        options: ["0 1 2", "1 2 3", "0 1 2 3", "1 2"],
        correct_answer: "0 1 2",
    },
    SeedQuestion {
        topic: "loops",
        difficulty: Difficulty::Easy,
        question_text: "Which loop runs at least once?",
        options: ["for", "while", "do-while", "forEach"],
        correct_answer: "do-while",
    },
    SeedQuestion {
        topic: "loops",
        difficulty: Difficulty::Medium,
        question_text: "How many times does the body execute in: for(let i=0; i<5; i+=2) {}?",
        options: ["2", "3", "5", "0"],
        correct_answer: "3",
    },
    SeedQuestion {
        topic: "loops",
        difficulty: Difficulty::Hard,
        question_text: "What is the time complexity of a nested loop with n and m iterations?",
        options: ["O(n)", "O(n+m)", "O(n*m)", "O(log n)"],
        correct_answer: "O(n*m)",
    },
    SeedQuestion {
        topic: "recursion",
        difficulty: Difficulty::Easy,
        question_text: "What is the base case typically used for factorial(n)?",
        options: ["n==0", "n==1", "n<=1", "n<0"],
        correct_answer: "n<=1",
    },
    SeedQuestion {
        topic: "recursion",
        difficulty: Difficulty::Easy,
        question_text: "Recursion uses which data structure internally?",
        options: ["Array", "Stack", "Queue", "Heap"],
        correct_answer: "Stack",
    },
    SeedQuestion {
        topic: "recursion",
        difficulty: Difficulty::Medium,
        question_text: "In recursion, what prevents infinite recursion?",
        options: ["Loop", "Base case", "Return type", "Parameters"],
        correct_answer: "Base case",
    },
    SeedQuestion {
        topic: "recursion",
        difficulty: Difficulty::Hard,
        question_text: "What is the space complexity of a recursive factorial with n calls?",
        options: ["O(1)", "O(n)", "O(n^2)", "O(log n)"],
        correct_answer: "O(n)",
    },
    SeedQuestion {
        topic: "arrays",
        difficulty: Difficulty::Easy,
        question_text: "What is the index of the first element in an array?",
        options: ["1", "0", "-1", "first"],
        correct_answer: "0",
    },
    SeedQuestion {
        topic: "arrays",
        difficulty: Difficulty::Easy,
        question_text: "Which method adds an element at the end of an array?",
        options: ["push", "pop", "shift", "unshift"],
        correct_answer: "push",
    },
    SeedQuestion {
        topic: "arrays",
        difficulty: Difficulty::Medium,
        question_text: "What does array.slice(1,4) return?",
        options: [
            "Elements at index 1,2,3",
            "Elements at index 1,2,3,4",
            "First 4 elements",
            "Last 4 elements",
        ],
        correct_answer: "Elements at index 1,2,3",
    },
    SeedQuestion {
        topic: "arrays",
        difficulty: Difficulty::Hard,
        question_text: "Best time complexity to find an element in an unsorted array?",
        options: ["O(1)", "O(log n)", "O(n)", "O(n^2)"],
        correct_answer: "O(n)",
    },
    SeedQuestion {
        topic: "dp",
        difficulty: Difficulty::Easy,
        question_text: "Dynamic Programming is mainly used to optimize what?",
        options: ["Time", "Space", "Both time and space", "Code length"],
        correct_answer: "Both time and space",
    },
    SeedQuestion {
        topic: "dp",
        difficulty: Difficulty::Medium,
        question_text: "What technique does DP use to avoid recomputation?",
        options: ["Loop", "Memoization", "Recursion only", "Sorting"],
        correct_answer: "Memoization",
    },
    SeedQuestion {
        topic: "dp",
        difficulty: Difficulty::Hard,
        question_text: "Fibonacci using DP has time complexity:",
        options: ["O(2^n)", "O(n)", "O(n^2)", "O(log n)"],
        correct_answer: "O(n)",
    },
];

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().init();

    let proxy = match DatabaseProxy::from_env().await {
        Ok(proxy) => proxy,
        Err(err) => {
            tracing::error!(error = %err, "seed failed: database not available");
            std::process::exit(1);
        }
    };

    let rows: Vec<questions::NewQuestion> = SEED_QUESTIONS
        .iter()
        .map(|q| questions::NewQuestion {
            topic: q.topic.to_string(),
            difficulty: q.difficulty,
            question_text: q.question_text.to_string(),
            options: q.options.iter().map(|o| o.to_string()).collect(),
            correct_answer: q.correct_answer.to_string(),
            explanation: None,
        })
        .collect();

    let result = async {
        questions::delete_all(&proxy).await?;
        let inserted = questions::insert_many(&proxy, &rows).await?;
        users::upsert_user(&proxy, "demo", "Demo Learner", "demo@localhost").await?;
        Ok::<u64, sqlx::Error>(inserted)
    }
    .await;

    match result {
        Ok(inserted) => tracing::info!(inserted, "seeded questions"),
        Err(err) => {
            tracing::error!(error = %err, "seed failed");
            std::process::exit(1);
        }
    }
}
