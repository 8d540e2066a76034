use super::*;

fn form(action: &str) -> ActionForm {
    ActionForm {
        action: Some(action.to_string()),
        ..ActionForm::default()
    }
}

#[test]
fn parses_known_tags() {
    for tag in [
        ActionTag::DeletePost,
        ActionTag::CreateComment,
        ActionTag::UpdateComment,
        ActionTag::DeleteComment,
    ] {
        assert_eq!(tag.as_str().parse::<ActionTag>(), Ok(tag));
    }
    assert_eq!(
        "9".parse::<ActionTag>(),
        Err(InvalidAction::UnknownTag("9".into()))
    );
}

#[test]
fn missing_tag_is_rejected() {
    assert_eq!(
        PostAction::try_from(ActionForm::default()),
        Err(InvalidAction::MissingTag)
    );
    assert_eq!(PostAction::try_from(form("")), Err(InvalidAction::MissingTag));
}

#[test]
fn create_comment_requires_every_field() {
    let mut submitted = form("1");
    submitted.comment_writer = Some("mina".into());
    submitted.comment_content = Some("hi".into());
    assert_eq!(
        PostAction::try_from(submitted.clone()),
        Err(InvalidAction::MissingField("commentPassword"))
    );

    submitted.comment_password = Some(String::new());
    assert_eq!(
        PostAction::try_from(submitted.clone()),
        Err(InvalidAction::MissingField("commentPassword"))
    );

    submitted.comment_password = Some("abcd".into());
    assert_eq!(
        PostAction::try_from(submitted),
        Ok(PostAction::CreateComment {
            writer: "mina".into(),
            content: "hi".into(),
            password: "abcd".into(),
        })
    );
}

#[test]
fn update_comment_keeps_missing_password_as_none() {
    let mut submitted = form("2");
    submitted.comment_id = Some("5".into());
    submitted.comment_content = Some("edited".into());
    assert_eq!(
        PostAction::try_from(submitted),
        Ok(PostAction::UpdateComment {
            comment_id: CommentId(5),
            content: "edited".into(),
            password: None,
        })
    );
}

#[test]
fn update_comment_without_content_is_rejected() {
    let mut submitted = form("2");
    submitted.comment_id = Some("5".into());
    submitted.comment_password = Some("abcd".into());
    assert_eq!(
        PostAction::try_from(submitted),
        Err(InvalidAction::MissingField("commentContent"))
    );
}

#[test]
fn non_numeric_ids_are_rejected() {
    let mut delete_comment = form("3");
    delete_comment.comment_id = Some("five".into());
    assert_eq!(
        PostAction::try_from(delete_comment),
        Err(InvalidAction::InvalidId("commentId"))
    );

}

#[test]
fn delete_post_id_is_optional_until_dispatch() {
    let mut delete_post = form("0");
    delete_post.password = Some("secret".into());
    assert_eq!(
        PostAction::try_from(delete_post.clone()),
        Ok(PostAction::DeletePost {
            id: None,
            password: Some("secret".into()),
        })
    );

    delete_post.id = Some("seven".into());
    assert!(matches!(
        PostAction::try_from(delete_post.clone()),
        Ok(PostAction::DeletePost { id: None, .. })
    ));

    delete_post.id = Some(" 7 ".into());
    assert!(matches!(
        PostAction::try_from(delete_post),
        Ok(PostAction::DeletePost {
            id: Some(PostId(7)),
            ..
        })
    ));
}

#[test]
fn debug_output_hides_passwords() {
    let action = PostAction::DeleteComment {
        comment_id: CommentId(5),
        password: Some("abcd".into()),
    };
    let rendered = format!("{action:?}");
    assert!(rendered.contains("DeleteComment"));
    assert!(!rendered.contains("abcd"));
}
