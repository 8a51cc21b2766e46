use proptest::{
    prelude::{any, BoxedStrategy, Just, Strategy},
    prop_assert_eq, prop_oneof, proptest,
};

use crate::{freeze, unfreeze, Element, Pure, Term, Unifiable, Variable, Zipped};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Var(usize);

impl Variable for Var {
    fn var_id(&self) -> usize { self.0 }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
struct Shape;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Node<T> {
    Int(i64),
    Pair(T, T),
    Tuple(Vec<T>),
}

impl Unifiable for Shape {
    type Layer<T: Element> = Node<T>;

    fn as_ref<'a, T: Element + 'a>(layer: &'a Node<T>) -> Node<&'a T> {
        match layer {
            Node::Int(value) => Node::Int(*value),
            Node::Pair(first, second) => Node::Pair(first, second),
            Node::Tuple(elements) => Node::Tuple(elements.iter().collect()),
        }
    }

    fn try_map<T: Element, U: Element, E>(
        layer: Node<T>,
        mut f: impl FnMut(T) -> Result<U, E>,
    ) -> Result<Node<U>, E> {
        Ok(match layer {
            Node::Int(value) => Node::Int(value),
            Node::Pair(first, second) => Node::Pair(f(first)?, f(second)?),
            Node::Tuple(elements) => Node::Tuple(
                elements.into_iter().map(f).collect::<Result<_, _>>()?,
            ),
        })
    }

    fn zip_match<T: Element>(
        left: Node<T>,
        right: Node<T>,
    ) -> Option<Node<Zipped<T>>> {
        match (left, right) {
            (Node::Int(left), Node::Int(right)) => {
                (left == right).then_some(Node::Int(left))
            }
            (Node::Pair(a, b), Node::Pair(c, d)) => Some(Node::Pair(
                Zipped::from_slots(a, c),
                Zipped::from_slots(b, d),
            )),
            (Node::Tuple(left), Node::Tuple(right))
                if left.len() == right.len() =>
            {
                Some(Node::Tuple(
                    left.into_iter()
                        .zip(right)
                        .map(|(left, right)| Zipped::from_slots(left, right))
                        .collect(),
                ))
            }
            _ => None,
        }
    }
}

fn int(value: i64) -> Term<Shape, Var> { Term::structured(Node::Int(value)) }

fn pair(first: Term<Shape, Var>, second: Term<Shape, Var>) -> Term<Shape, Var> {
    Term::structured(Node::Pair(first, second))
}

fn var(id: usize) -> Term<Shape, Var> { Term::Variable(Var(id)) }

fn pure() -> BoxedStrategy<Pure<Shape>> {
    let leaf = any::<i64>().prop_map(|value| Pure::new(Node::Int(value)));

    leaf.prop_recursive(6, 48, 4, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone())
                .prop_map(|(first, second)| {
                    Pure::new(Node::Pair(first, second))
                }),
            proptest::collection::vec(inner, 0..4)
                .prop_map(|elements| Pure::new(Node::Tuple(elements))),
        ]
    })
    .boxed()
}

fn term() -> BoxedStrategy<Term<Shape, Var>> {
    let leaf = prop_oneof![
        any::<i64>().prop_map(int),
        (0..4usize).prop_map(var),
        Just(Term::structured(Node::Tuple(Vec::new()))),
    ];

    leaf.prop_recursive(6, 48, 4, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone())
                .prop_map(|(first, second)| pair(first, second)),
            proptest::collection::vec(inner, 0..4)
                .prop_map(|elements| Term::structured(Node::Tuple(elements))),
        ]
    })
    .boxed()
}

#[test]
fn freeze_rejects_variables() {
    let term = pair(int(1), pair(var(0), int(2)));

    assert_eq!(freeze(&term), None);
    assert_eq!(freeze(&var(3)), None);
}

#[test]
fn freeze_variable_free_term() {
    let tuple = Term::structured(Node::Tuple(vec![int(2), int(3)]));
    let term = pair(int(1), tuple);

    let pure = freeze(&term).unwrap();

    assert_eq!(
        pure,
        Pure::new(Node::Pair(
            Pure::new(Node::Int(1)),
            Pure::new(Node::Tuple(vec![
                Pure::new(Node::Int(2)),
                Pure::new(Node::Int(3)),
            ])),
        ))
    );
}

#[test]
fn variables_in_order() {
    let tuple = Term::structured(Node::Tuple(vec![var(0), var(2)]));
    let term = pair(var(2), tuple);

    assert_eq!(term.variables(), vec![&Var(2), &Var(0), &Var(2)]);
    assert_eq!(term.fold_variables(0, |count, _| count + 1), 3);
    assert!(!term.is_ground());
    assert!(pair(int(1), int(2)).is_ground());
}

#[test]
fn map_variables_substitutes() {
    let term = pair(var(0), pair(var(1), var(0)));

    let substituted = term.map_variables(|variable: Var| {
        if variable.0 == 0 {
            int(7)
        } else {
            Term::Variable(Var(variable.0 + 10))
        }
    });

    assert_eq!(substituted, pair(int(7), pair(var(11), int(7))));
}

#[test]
fn try_map_variables_short_circuits() {
    let term = pair(var(0), pair(var(1), var(2)));
    let mut visited = Vec::new();

    let result = term.try_map_variables(|variable: Var| {
        visited.push(variable.0);

        if variable.0 == 1 {
            Err(variable)
        } else {
            Ok(Term::<Shape, Var>::Variable(variable))
        }
    });

    assert_eq!(result, Err(Var(1)));
    assert_eq!(visited, vec![0, 1]);
}

#[test]
fn zipped_resolves_equal_slots() {
    assert_eq!(Zipped::from_slots(1, 1), Zipped::Resolved(1));
    assert_eq!(Zipped::from_slots(1, 2), Zipped::Pair(1, 2));
}

#[test]
fn zip_match_disagreeing_shapes() {
    let left = Node::Pair(int(1), int(2));
    let right = Node::Tuple(vec![int(1), int(2)]);

    assert!(Shape::zip_match(left, right).is_none());
    assert!(Shape::zip_match(
        Node::<Term<Shape, Var>>::Int(1),
        Node::Int(2)
    )
    .is_none());
}

proptest! {
    #[test]
    fn freeze_unfreeze_round_trip(pure in pure()) {
        let term: Term<Shape, Var> = unfreeze(pure.clone());

        prop_assert_eq!(freeze(&term), Some(pure));
    }

    #[test]
    fn freeze_succeeds_only_on_ground_terms(term in term()) {
        prop_assert_eq!(freeze(&term).is_some(), term.is_ground());
    }

    #[test]
    fn identity_map_preserves_term(term in term()) {
        prop_assert_eq!(term.clone().map_variables(Term::Variable), term);
    }
}
