use proptest::{
    arbitrary::Arbitrary, prop_assert, prop_assert_eq, proptest,
    test_runner::TestCaseResult,
};
use unifix_binding::{BindingStore, StoreError};

use crate::{
    apply_bindings,
    test::{apply, init_logging, int, pair, store_with, var, Node, Template},
    unify, unify_occurs, unify_term, TermMismatchError, UnificationError,
};

#[test]
fn pair_scenario() {
    init_logging();

    let (mut store, variables) = store_with(2);
    let (x, y) = (variables[0], variables[1]);

    unify(&mut store, &pair(var(x), int(5)), &pair(int(5), var(y))).unwrap();

    assert_eq!(store.lookup_var(&x), Ok(Some(int(5))));
    assert_eq!(store.lookup_var(&y), Ok(Some(int(5))));
}

#[test]
fn cyclic_binding_scenario() {
    init_logging();

    let (mut store, variables) = store_with(1);
    let x = variables[0];
    store.bind_var(&x, pair(var(x), int(1))).unwrap();

    assert_eq!(unify(&mut store, &var(x), &var(x)), Ok(()));

    let error = apply_bindings(&store, &var(x)).unwrap_err();

    assert_eq!(error.into_occurs_in().unwrap().variable, x);
}

#[test]
fn arity_mismatch() {
    let (mut store, variables) = store_with(3);
    let arguments = variables.iter().copied().map(var).collect::<Vec<_>>();

    let left = apply("f", arguments[..2].to_vec());
    let right = apply("f", arguments.clone());

    assert_eq!(
        unify(&mut store, &left, &right),
        Err(UnificationError::TermMismatch(TermMismatchError::new(
            Node::Apply("f".to_owned(), arguments[..2].to_vec()),
            Node::Apply("f".to_owned(), arguments),
        )))
    );
    assert_eq!(store.bound_count(), 0);
}

#[test]
fn nested_mismatch_carries_the_disagreeing_layers() {
    let (mut store, variables) = store_with(1);
    let x = variables[0];

    let error = unify(
        &mut store,
        &pair(var(x), apply("f", vec![int(1)])),
        &pair(int(2), apply("g", vec![int(1)])),
    )
    .unwrap_err();

    assert_eq!(
        error.into_term_mismatch().unwrap(),
        TermMismatchError::new(
            Node::Apply("f".to_owned(), vec![int(1)]),
            Node::Apply("g".to_owned(), vec![int(1)]),
        )
    );

    // the failure doesn't undo the bindings made before it
    assert_eq!(store.lookup_var(&x), Ok(Some(int(2))));
}

#[test]
fn atomically_discards_partial_bindings() {
    let (mut store, variables) = store_with(1);
    let x = variables[0];

    let result = store.atomically(|store| {
        unify(
            store,
            &pair(var(x), int(1)),
            &pair(int(2), int(3)),
        )
    });

    assert!(result.unwrap_err().is_term_mismatch());
    assert_eq!(store.lookup_var(&x), Ok(None));
    assert_eq!(store.transaction_depth(), 0);
}

#[test]
fn free_variables_are_linked() {
    let (mut store, variables) = store_with(2);
    let (x, y) = (variables[0], variables[1]);

    unify(&mut store, &var(x), &var(y)).unwrap();

    assert_eq!(store.lookup_var(&x), Ok(Some(var(y))));
    assert_eq!(store.lookup_var(&y), Ok(None));

    // already unified
    unify(&mut store, &var(y), &var(x)).unwrap();

    assert_eq!(store.bound_count(), 1);
}

#[test]
fn bound_variable_is_kept_as_representative() {
    let (mut store, variables) = store_with(2);
    let (x, y) = (variables[0], variables[1]);
    store.bind_var(&x, int(1)).unwrap();

    unify(&mut store, &var(x), &var(y)).unwrap();

    assert_eq!(store.lookup_var(&x), Ok(Some(int(1))));
    assert_eq!(store.lookup_var(&y), Ok(Some(var(x))));
}

#[test]
fn bound_variables_are_matched() {
    let (mut store, variables) = store_with(4);
    let (x, y, a, b) = (variables[0], variables[1], variables[2], variables[3]);
    store.bind_var(&x, pair(var(a), int(1))).unwrap();
    store.bind_var(&y, pair(int(2), var(b))).unwrap();

    unify(&mut store, &var(x), &var(y)).unwrap();

    let resolved = pair(int(2), int(1));

    assert_eq!(apply_bindings(&store, &var(x)), Ok(resolved.clone()));
    assert_eq!(apply_bindings(&store, &var(y)), Ok(resolved));
    assert_eq!(store.lookup_var(&x), Ok(Some(var(y))));
}

#[test]
fn unify_term_returns_unified_term() {
    let (mut store, variables) = store_with(2);
    let (x, y) = (variables[0], variables[1]);

    let unified =
        unify_term(&mut store, &pair(var(x), int(1)), &pair(int(2), var(y)))
            .unwrap();

    assert_eq!(apply_bindings(&store, &unified), Ok(pair(int(2), int(1))));
}

#[test]
fn occurs_check_is_lazy() {
    init_logging();

    let (mut store, variables) = store_with(1);
    let x = variables[0];
    let cyclic = pair(var(x), int(1));

    // the cycle is created silently
    unify(&mut store, &var(x), &cyclic).unwrap();
    assert_eq!(store.lookup_var(&x), Ok(Some(cyclic.clone())));

    // and reported once it's walked into
    let error = unify(&mut store, &var(x), &pair(pair(int(1), int(1)), int(1)))
        .unwrap_err();
    let error = error.into_occurs_in().unwrap();

    assert_eq!(error.variable, x);
    assert_eq!(error.term, cyclic);
}

#[test]
fn eager_occurs_check() {
    init_logging();

    let (mut store, variables) = store_with(2);
    let (x, y) = (variables[0], variables[1]);

    let error =
        unify_occurs(&mut store, &var(x), &pair(var(x), int(1))).unwrap_err();

    assert_eq!(error.into_occurs_in().unwrap().variable, x);
    assert_eq!(store.lookup_var(&x), Ok(None));

    // the cycle may also go through another variable
    store.bind_var(&y, apply("f", vec![var(x)])).unwrap();

    assert!(unify_occurs(&mut store, &var(x), &pair(var(y), int(1)))
        .unwrap_err()
        .is_occurs_in());
    assert!(unify_occurs(&mut store, &var(x), &var(y))
        .unwrap_err()
        .is_occurs_in());
    assert_eq!(store.lookup_var(&x), Ok(None));
}

#[test]
fn store_errors_are_forwarded() {
    let error: UnificationError<crate::test::Shape, unifix_binding::IntVar, _> =
        UnificationError::Store(StoreError::Exhausted { limit: 1 });

    assert_eq!(
        error.to_string(),
        "the binding store failed: the binding store exhausted its limit of \
         1 variables"
    );
    assert_eq!(error.as_store(), Some(&StoreError::Exhausted { limit: 1 }));
}

fn identity_impl(template: &Template) -> TestCaseResult {
    let (mut store, variables) = store_with(crate::test::VARIABLES);

    // two separately built copies of the same term
    let left = template.instantiate(&variables);
    let right = template.instantiate(&variables);
    let before = store.clone();

    prop_assert_eq!(unify(&mut store, &left, &right), Ok(()));
    prop_assert_eq!(&store, &before);

    Ok(())
}

fn symmetry_impl(
    left: &Template,
    right: &Template,
    eager: bool,
) -> TestCaseResult {
    let (mut forward, variables) = store_with(crate::test::VARIABLES);
    let mut backward = forward.clone();

    let left = left.instantiate(&variables);
    let right = right.instantiate(&variables);

    let (forward, backward) = if eager {
        (
            unify_occurs(&mut forward, &left, &right),
            unify_occurs(&mut backward, &right, &left),
        )
    } else {
        (
            unify(&mut forward, &left, &right),
            unify(&mut backward, &right, &left),
        )
    };

    prop_assert_eq!(forward.is_ok(), backward.is_ok());

    Ok(())
}

fn unifier_makes_terms_equal_impl(
    left: &Template,
    right: &Template,
) -> TestCaseResult {
    let (mut store, variables) = store_with(crate::test::VARIABLES);

    let left = left.instantiate(&variables);
    let right = right.instantiate(&variables);

    if unify_occurs(&mut store, &left, &right).is_ok() {
        let left = apply_bindings(&store, &left);
        let right = apply_bindings(&store, &right);

        prop_assert!(left.is_ok());
        prop_assert_eq!(left, right);
    }

    Ok(())
}

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        cases: 1024,
        ..Default::default()
    })]

    #[test]
    fn identity(template in Template::arbitrary_with(true)) {
        identity_impl(&template)?;
    }

    #[test]
    fn symmetry_against_ground_term(
        left in Template::arbitrary_with(true),
        right in Template::arbitrary(),
    ) {
        prop_assert!(right.is_ground());
        symmetry_impl(&left, &right, false)?;
    }

    #[test]
    fn symmetry(
        left in Template::arbitrary_with(true),
        right in Template::arbitrary_with(true),
    ) {
        symmetry_impl(&left, &right, false)?;
    }

    #[test]
    fn symmetry_with_occurs_check(
        left in Template::arbitrary_with(true),
        right in Template::arbitrary_with(true),
    ) {
        symmetry_impl(&left, &right, true)?;
    }

    #[test]
    fn unifier_makes_terms_equal(
        left in Template::arbitrary_with(true),
        right in Template::arbitrary_with(true),
    ) {
        unifier_makes_terms_equal_impl(&left, &right)?;
    }
}
