//! Built-in content so the memory backend is useful without a TOML bank.

use chrono::{TimeZone, Utc};

use crate::domain::{Challenge, Definition, Difficulty};

/// Minimal set of built-in challenges (Python, graded by exact solution text).
pub fn seed_challenges() -> Vec<Challenge> {
  vec![
    Challenge {
      id: "fibonacci".into(),
      title: "Fibonacci Sequence".into(),
      description: "Write a function that returns the nth number in the Fibonacci sequence. \
        F(0) = 0, F(1) = 1, and F(n) = F(n-1) + F(n-2) for n > 1."
        .into(),
      difficulty: Difficulty::Easy,
      language: "python".into(),
      topic: "loops".into(),
      starter_code: "def fibonacci(n):\n    # Your code here\n    pass\n\nprint(fibonacci(10))  # 55\n".into(),
      solution: "def fibonacci(n):\n    if n <= 0:\n        return 0\n    elif n == 1:\n        return 1\n\n    a, b = 0, 1\n    for _ in range(2, n + 1):\n        a, b = b, a + b\n    return b\n\nprint(fibonacci(10))  # 55\n".into(),
      test_cases: serde_json::json!([{ "input": 10, "expected": 55 }]),
      created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single(),
    },
    Challenge {
      id: "palindrome".into(),
      title: "Palindrome Checker".into(),
      description: "Write a function that checks if a given string is a palindrome, ignoring \
        spaces, punctuation, and capitalization."
        .into(),
      difficulty: Difficulty::Easy,
      language: "python".into(),
      topic: "strings".into(),
      starter_code: "def is_palindrome(text):\n    # Your code here\n    pass\n".into(),
      solution: "def is_palindrome(text):\n    text = ''.join(c.lower() for c in text if c.isalnum())\n    return text == text[::-1]\n".into(),
      test_cases: serde_json::json!([
        { "input": "racecar", "expected": true },
        { "input": "hello", "expected": false }
      ]),
      created_at: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).single(),
    },
    Challenge {
      id: "prime".into(),
      title: "Prime Number Checker".into(),
      description: "Write a function that determines whether a given number is prime.".into(),
      difficulty: Difficulty::Medium,
      language: "python".into(),
      topic: "math".into(),
      starter_code: "def is_prime(n):\n    # Your code here\n    pass\n".into(),
      solution: "def is_prime(n):\n    if n <= 1:\n        return False\n    if n <= 3:\n        return True\n    if n % 2 == 0 or n % 3 == 0:\n        return False\n    i = 5\n    while i * i <= n:\n        if n % i == 0 or n % (i + 2) == 0:\n            return False\n        i += 6\n    return True\n".into(),
      test_cases: serde_json::json!([
        { "input": 7, "expected": true },
        { "input": 15, "expected": false }
      ]),
      created_at: Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).single(),
    },
  ]
}

pub fn seed_definitions() -> Vec<Definition> {
  vec![
    Definition {
      id: "closures".into(),
      title: "Closure".into(),
      language: "python".into(),
      difficulty: Some("medium".into()),
      definition_content: "A function object that remembers values from its enclosing scope.".into(),
      comparison: Some("Unlike a plain function, a closure carries captured variables.".into()),
      code_example: Some("def outer(x):\n    def inner():\n        return x\n    return inner\n".into()),
    },
    Definition {
      id: "list-comprehension".into(),
      title: "List comprehension".into(),
      language: "python".into(),
      difficulty: Some("easy".into()),
      definition_content: "A compact expression that builds a list from an iterable.".into(),
      comparison: None,
      code_example: Some("[x * x for x in range(5)]\n".into()),
    },
    Definition {
      id: "ownership".into(),
      title: "Ownership".into(),
      language: "rust".into(),
      difficulty: None,
      definition_content: "Every value has a single owner; the value is dropped when the owner goes out of scope.".into(),
      comparison: None,
      code_example: None,
    },
  ]
}
