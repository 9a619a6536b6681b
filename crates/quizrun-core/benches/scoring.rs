use criterion::{black_box, criterion_group, criterion_main, Criterion};

use quizrun_core::answers::AnswerSnapshot;
use quizrun_core::model::{Question, QuizDefinition};
use quizrun_core::scoring::{grade, score};

fn make_quiz(questions: usize) -> QuizDefinition {
    QuizDefinition {
        id: "bench".into(),
        title: "Bench".into(),
        description: String::new(),
        time_limit_secs: 600,
        questions: (0..questions)
            .map(|i| {
                if i % 2 == 0 {
                    Question::multiple_choice("pick", &["alpha", "beta", "gamma"], "beta")
                } else {
                    Question::free_text("type", "photosynthesis")
                }
            })
            .collect(),
        class_ids: vec![],
    }
}

fn half_right(quiz: &QuizDefinition) -> AnswerSnapshot {
    quiz.questions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let given = if i % 4 < 2 {
                q.correct_answer.clone()
            } else {
                "wrong".to_string()
            };
            (i, given)
        })
        .collect()
}

fn bench_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("score");

    for n in [10, 100, 1000] {
        let quiz = make_quiz(n);
        let answers = half_right(&quiz);
        group.bench_function(format!("questions={n}"), |b| {
            b.iter(|| score(black_box(&quiz), black_box(&answers)))
        });
    }

    group.bench_function("unanswered", |b| {
        let quiz = make_quiz(100);
        let answers = AnswerSnapshot::default();
        b.iter(|| score(black_box(&quiz), black_box(&answers)))
    });

    group.finish();
}

fn bench_grade(c: &mut Criterion) {
    let mut group = c.benchmark_group("grade");
    let quiz = make_quiz(100);
    let answers = half_right(&quiz);

    group.bench_function("questions=100", |b| {
        b.iter(|| grade(black_box(&quiz), black_box(&answers)))
    });

    group.finish();
}

criterion_group!(benches, bench_score, bench_grade);
criterion_main!(benches);
