#[cfg(test)]
mod environment_tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use rox::environment::Environment;
    use rox::error::RuntimeError;
    use rox::value::Value;

    type Frame = Rc<RefCell<Environment>>;

    /// globals → middle → inner
    fn chain() -> (Frame, Frame, Frame) {
        let globals: Frame = Environment::new().shared();
        let middle: Frame = Environment::with_enclosing(Rc::clone(&globals)).shared();
        let inner: Frame = Environment::with_enclosing(Rc::clone(&middle)).shared();

        (globals, middle, inner)
    }

    #[test]
    fn test_define_and_get_in_one_frame() {
        let mut env = Environment::new();
        env.define("a", Value::from(1.0));

        assert_eq!(env.get("a"), Some(Value::Number(1.0)));
        assert_eq!(env.get("b"), None);
        assert!(env.contains("a"));
    }

    #[test]
    fn test_redefinition_overwrites() {
        let mut env = Environment::new();
        env.define("a", Value::from(1.0));
        env.define("a", Value::from("two"));

        assert_eq!(env.get("a"), Some(Value::from("two")));
    }

    #[test]
    fn test_assign_requires_existing_binding() {
        let mut env = Environment::new();

        assert!(!env.assign("a", Value::Nil));

        env.define("a", Value::Nil);
        assert!(env.assign("a", Value::from(true)));
        assert_eq!(env.get("a"), Some(Value::Bool(true)));
    }

    #[test]
    fn test_get_at_reads_exact_frame() {
        let (globals, middle, inner) = chain();

        globals.borrow_mut().define("x", Value::from("global"));
        middle.borrow_mut().define("x", Value::from("middle"));
        inner.borrow_mut().define("x", Value::from("inner"));

        assert_eq!(Environment::get_at(&inner, 0, "x", 1), Ok(Value::from("inner")));
        assert_eq!(Environment::get_at(&inner, 1, "x", 1), Ok(Value::from("middle")));
        assert_eq!(Environment::get_at(&inner, 2, "x", 1), Ok(Value::from("global")));
        assert_eq!(Environment::get_global(&inner, "x", 1), Ok(Value::from("global")));
    }

    #[test]
    fn test_get_at_does_not_search_outward() {
        let (globals, _middle, inner) = chain();
        globals.borrow_mut().define("x", Value::Nil);

        assert_eq!(
            Environment::get_at(&inner, 0, "x", 7),
            Err(RuntimeError::UndefinedVariable {
                name: "x".to_string(),
                line: 7,
            })
        );

        // Past the end of the chain.
        assert!(Environment::get_at(&inner, 5, "x", 7).is_err());
    }

    #[test]
    fn test_assign_at_then_get_at() {
        let (_globals, middle, inner) = chain();
        middle.borrow_mut().define("count", Value::from(0.0));

        for n in 1..=3 {
            Environment::assign_at(&inner, 1, "count", Value::from(n as f64), 1)
                .expect("binding exists");
            assert_eq!(
                Environment::get_at(&inner, 1, "count", 1),
                Ok(Value::Number(n as f64))
            );
        }

        assert!(!inner.borrow().contains("count"));
    }

    #[test]
    fn test_assign_global_requires_definition() {
        let (globals, _middle, inner) = chain();

        assert_eq!(
            Environment::assign_global(&inner, "g", Value::Nil, 3),
            Err(RuntimeError::UndefinedVariable {
                name: "g".to_string(),
                line: 3,
            })
        );

        globals.borrow_mut().define("g", Value::Nil);
        assert_eq!(Environment::assign_global(&inner, "g", Value::from(2.0), 3), Ok(()));
        assert_eq!(globals.borrow().get("g"), Some(Value::Number(2.0)));
    }

    #[test]
    fn test_ancestor_and_global() {
        let (globals, middle, inner) = chain();

        let found: Frame = Environment::ancestor(&inner, 1).expect("middle frame");
        assert!(Rc::ptr_eq(&found, &middle));
        assert!(Rc::ptr_eq(&Environment::global(&inner), &globals));
        assert!(Environment::ancestor(&inner, 3).is_none());
        assert!(globals.borrow().enclosing().is_none());
    }

    #[test]
    fn test_frames_outlive_their_creator() {
        let (globals, _middle, inner) = chain();
        let captured: Frame = Rc::clone(&inner);
        drop(inner);

        captured.borrow_mut().define("kept", Value::from(true));
        assert_eq!(Environment::get_at(&captured, 0, "kept", 1), Ok(Value::Bool(true)));
        assert!(Rc::ptr_eq(&Environment::global(&captured), &globals));
    }
}
