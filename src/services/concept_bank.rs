use serde::Serialize;

use crate::services::difficulty::Difficulty;

const QUESTIONS_PER_SUBJECT: usize = 15;

/// An immutable term/fact pair. Each subject carries exactly ten of these;
/// they are the only source the synthetic bank is generated from.
#[derive(Debug, Clone, Copy)]
pub struct Concept {
    pub term: &'static str,
    pub fact: &'static str,
}

const fn concept(term: &'static str, fact: &'static str) -> Concept {
    Concept { term, fact }
}

const MATHEMATICS: [Concept; 10] = [
    concept("Prime number", "A number that has exactly two positive divisors: 1 and itself."),
    concept("Mean", "The average found by dividing the sum by the count."),
    concept("Median", "The middle value in an ordered list."),
    concept("Derivative", "The instantaneous rate of change of a function."),
    concept("Integral", "A value that represents accumulation, often area under a curve."),
    concept("Matrix determinant", "A scalar value computed from a square matrix."),
    concept("Pythagorean theorem", "In a right triangle, a^2 + b^2 = c^2."),
    concept("Probability", "The ratio of favorable outcomes to total possible outcomes."),
    concept("Factorial", "The product of all positive integers up to n, written n!."),
    concept("Slope", "The change in y divided by the change in x."),
];

const SCIENCE: [Concept; 10] = [
    concept("Photosynthesis", "Plants use sunlight, water, and carbon dioxide to make glucose and oxygen."),
    concept("Mitosis", "Cell division that produces two genetically identical daughter cells."),
    concept("Atom", "The smallest unit of an element that retains chemical properties."),
    concept("Gravity", "The force that attracts objects with mass toward each other."),
    concept("Newton second law", "Force equals mass multiplied by acceleration (F = ma)."),
    concept("Evaporation", "The process where liquid changes into gas at the surface."),
    concept("Condensation", "The process where gas changes into liquid."),
    concept("DNA", "The molecule that stores genetic instructions in living organisms."),
    concept("Ecosystem", "A community of organisms interacting with their physical environment."),
    concept("pH scale", "A scale used to measure how acidic or basic a substance is."),
];

const HISTORY: [Concept; 10] = [
    concept("Renaissance", "A period of cultural revival in Europe after the Middle Ages."),
    concept("Industrial Revolution", "The shift from hand production to machines in the 18th and 19th centuries."),
    concept("Magna Carta", "A 1215 charter that limited the power of the English king."),
    concept("World War I", "A global war that began in 1914."),
    concept("World War II", "A global war that began in 1939."),
    concept("Cold War", "A period of political tension between the US and USSR after World War II."),
    concept("French Revolution", "A major social and political upheaval in France that began in 1789."),
    concept("Fall of Western Roman Empire", "Conventionally dated to 476 CE."),
    concept("Fall of Berlin Wall", "A symbolic Cold War event that happened in 1989."),
    concept("Printing press", "A technology popularized by Gutenberg in the 15th century."),
];

const GEOGRAPHY: [Concept; 10] = [
    concept("Equator", "An imaginary line at 0 degrees latitude dividing Earth into hemispheres."),
    concept("Prime Meridian", "The reference line at 0 degrees longitude."),
    concept("Latitude", "Angular distance north or south of the Equator."),
    concept("Longitude", "Angular distance east or west of the Prime Meridian."),
    concept("Delta", "Landform created by sediment deposits at a river mouth."),
    concept("Archipelago", "A group or chain of islands."),
    concept("Peninsula", "Land surrounded by water on three sides."),
    concept("Monsoon", "A seasonal wind pattern often associated with heavy rainfall."),
    concept("Tundra", "A cold biome with low vegetation and little tree growth."),
    concept("Plate tectonics", "Theory that Earth lithosphere is divided into moving plates."),
];

const PROGRAMMING: [Concept; 10] = [
    concept("Variable", "A named storage location for data values in code."),
    concept("Loop", "A control structure that repeats a block of code."),
    concept("Function", "A reusable block of code designed to perform a task."),
    concept("Array", "An ordered collection of values accessed by index."),
    concept("Object", "A data structure that stores key-value pairs."),
    concept("Boolean", "A data type that has two values: true or false."),
    concept("Compiler", "A program that translates source code to machine code before execution."),
    concept("Interpreter", "A program that executes source code line by line."),
    concept("API", "A defined interface that allows software systems to communicate."),
    concept("Recursion", "A technique where a function calls itself with a base case."),
];

const DATA_STRUCTURES: [Concept; 10] = [
    concept("Stack", "A linear structure that follows Last In, First Out (LIFO)."),
    concept("Queue", "A linear structure that follows First In, First Out (FIFO)."),
    concept("Linked list", "A sequence of nodes connected through references."),
    concept("Binary tree", "A hierarchical structure where each node has at most two children."),
    concept("Hash table", "A structure that maps keys to values using a hash function."),
    concept("Heap", "A complete binary tree that satisfies a heap-order property."),
    concept("Graph", "A structure made of vertices connected by edges."),
    concept("Trie", "A tree-based structure optimized for prefix searching in strings."),
    concept("Deque", "A structure that supports insertion and deletion at both ends."),
    concept("Balanced BST", "A binary search tree designed to maintain near-logarithmic height."),
];

const ALGORITHMS: [Concept; 10] = [
    concept("Binary search", "A search method for sorted data that halves the search space each step."),
    concept("Merge sort", "A divide-and-conquer sorting algorithm with O(n log n) time complexity."),
    concept("Quick sort", "A sorting algorithm that partitions data around a pivot."),
    concept("Breadth-first search", "A graph traversal that explores neighbors level by level."),
    concept("Depth-first search", "A graph traversal that explores as deep as possible before backtracking."),
    concept("Dynamic programming", "A method that stores and reuses solutions to overlapping subproblems."),
    concept("Greedy algorithm", "An approach that chooses the locally optimal option at each step."),
    concept("Dijkstra algorithm", "An algorithm for shortest paths in weighted graphs with non-negative edges."),
    concept("Big O notation", "A notation describing upper-bound growth of runtime or space."),
    concept("Two-pointer technique", "A pattern using two indices that move through a data structure."),
];

const ENGLISH: [Concept; 10] = [
    concept("Noun", "A word that names a person, place, thing, or idea."),
    concept("Verb", "A word that expresses action or a state of being."),
    concept("Adjective", "A word that describes or modifies a noun."),
    concept("Adverb", "A word that modifies a verb, adjective, or another adverb."),
    concept("Pronoun", "A word used in place of a noun."),
    concept("Subject-verb agreement", "A grammar rule where the verb form matches the subject number."),
    concept("Past tense", "A verb form used to describe actions completed in the past."),
    concept("Synonym", "A word with a similar meaning to another word."),
    concept("Antonym", "A word with the opposite meaning of another word."),
    concept("Thesis statement", "The central claim or main idea of an essay."),
];

const SUBJECTS: [(&str, &[Concept; 10]); 8] = [
    ("Mathematics", &MATHEMATICS),
    ("Science", &SCIENCE),
    ("History", &HISTORY),
    ("Geography", &GEOGRAPHY),
    ("Programming", &PROGRAMMING),
    ("Data Structures", &DATA_STRUCTURES),
    ("Algorithms", &ALGORITHMS),
    ("English", &ENGLISH),
];

/// One synthetic bank question. Regenerating for the same subject always
/// yields the identical sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankQuestion {
    pub topic: String,
    pub difficulty: Difficulty,
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

/// Resolves a free-form subject string to its canonical name.
/// Returns `None` for unsupported subjects.
pub fn resolve_subject(input: &str) -> Option<&'static str> {
    match input.trim().to_lowercase().as_str() {
        "mathematics" | "math" => Some("Mathematics"),
        "science" => Some("Science"),
        "history" => Some("History"),
        "geography" => Some("Geography"),
        "programming" => Some("Programming"),
        "data structures" | "datastructures" => Some("Data Structures"),
        "algorithms" => Some("Algorithms"),
        "english" => Some("English"),
        _ => None,
    }
}

pub fn subjects() -> impl Iterator<Item = &'static str> {
    SUBJECTS.iter().map(|(name, _)| *name)
}

/// The full generated bank for a subject (up to 15 questions), or empty for
/// an unsupported subject. Pure over `(subject, concept index)`.
pub fn questions_for(subject: &str) -> Vec<BankQuestion> {
    let Some(&(name, concepts)) = SUBJECTS.iter().find(|(name, _)| *name == subject) else {
        return Vec::new();
    };

    let mut questions = Vec::with_capacity(concepts.len() * 2);
    for i in 0..concepts.len() {
        questions.push(definition_question(name, concepts, i));
        questions.push(term_question(name, concepts, i));
    }
    questions.truncate(QUESTIONS_PER_SUBJECT);
    questions
}

// Distractors come from fixed offsets so the option set is stable; the
// rotation varies the position of the correct answer across the bank.
fn distractors(concepts: &[Concept], i: usize) -> [Concept; 3] {
    let len = concepts.len();
    [
        concepts[(i + 1) % len],
        concepts[(i + 3) % len],
        concepts[(i + 5) % len],
    ]
}

fn rotate(items: [&str; 4], by: usize) -> Vec<String> {
    let shift = by % items.len();
    items[shift..]
        .iter()
        .chain(items[..shift].iter())
        .map(|s| s.to_string())
        .collect()
}

// The two directions use different difficulty boundaries (4/7 vs 3/7) on
// purpose, so the paired questions for one concept do not cluster at the
// same difficulty.
fn diff_a(index: usize) -> Difficulty {
    if index < 4 {
        Difficulty::Easy
    } else if index < 7 {
        Difficulty::Medium
    } else {
        Difficulty::Hard
    }
}

fn diff_b(index: usize) -> Difficulty {
    if index < 3 {
        Difficulty::Easy
    } else if index < 7 {
        Difficulty::Medium
    } else {
        Difficulty::Hard
    }
}

fn definition_question(subject: &str, concepts: &[Concept], i: usize) -> BankQuestion {
    let current = concepts[i];
    let [d1, d2, d3] = distractors(concepts, i);
    BankQuestion {
        topic: subject.to_string(),
        difficulty: diff_a(i),
        question_text: format!("What best describes \"{}\"?", current.term),
        options: rotate([current.fact, d1.fact, d2.fact, d3.fact], i % 4),
        correct_answer: current.fact.to_string(),
    }
}

fn term_question(subject: &str, concepts: &[Concept], i: usize) -> BankQuestion {
    let current = concepts[i];
    let [d1, d2, d3] = distractors(concepts, i);
    BankQuestion {
        topic: subject.to_string(),
        difficulty: diff_b(i),
        question_text: format!("Which term matches this definition: \"{}\"?", current.fact),
        options: rotate([current.term, d1.term, d2.term, d3.term], (i + 2) % 4),
        correct_answer: current.term.to_string(),
    }
}

/// The dedup key used when persisting bank questions.
pub fn dedup_key(difficulty: Difficulty, question_text: &str) -> (String, String) {
    (
        difficulty.as_str().to_string(),
        question_text.trim().to_lowercase(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_is_deterministic() {
        for subject in subjects() {
            assert_eq!(questions_for(subject), questions_for(subject));
        }
    }

    #[test]
    fn test_every_subject_yields_fifteen_questions() {
        for subject in subjects() {
            assert_eq!(questions_for(subject).len(), 15, "subject {subject}");
        }
    }

    #[test]
    fn test_options_are_unique_and_contain_the_answer() {
        for subject in subjects() {
            for q in questions_for(subject) {
                assert_eq!(q.options.len(), 4, "{}", q.question_text);
                let unique: std::collections::HashSet<_> = q.options.iter().collect();
                assert_eq!(unique.len(), 4, "{}", q.question_text);
                assert!(q.options.contains(&q.correct_answer), "{}", q.question_text);
            }
        }
    }

    #[test]
    fn test_unsupported_subject_is_empty() {
        assert!(questions_for("Botany").is_empty());
    }

    #[test]
    fn test_alias_resolution() {
        assert_eq!(resolve_subject("math"), Some("Mathematics"));
        assert_eq!(resolve_subject("  DataStructures "), Some("Data Structures"));
        assert_eq!(resolve_subject("botany"), None);
        assert_eq!(resolve_subject(""), None);
    }

    #[test]
    fn test_direction_difficulty_split_is_asymmetric() {
        let questions = questions_for("Mathematics");
        // Question pairs alternate: even indexes are definition questions
        // (4/7 split), odd indexes are term questions (3/7 split).
        assert_eq!(questions[0].difficulty, Difficulty::Easy);
        assert_eq!(questions[6].difficulty, Difficulty::Easy); // def #3
        assert_eq!(questions[7].difficulty, Difficulty::Medium); // term #3
        assert_eq!(questions[8].difficulty, Difficulty::Medium); // def #4
        assert_eq!(questions[14].difficulty, Difficulty::Hard); // def #7
    }

    #[test]
    fn test_rotation_moves_the_correct_answer() {
        let questions = questions_for("Science");
        let positions: std::collections::HashSet<usize> = questions
            .iter()
            .map(|q| q.options.iter().position(|o| o == &q.correct_answer).unwrap())
            .collect();
        assert!(positions.len() > 1, "correct answer should not be pinned to one slot");
    }
}
