diesel::table! {
    accounts (id) {
        id -> Int8,
        #[max_length = 255]
        name -> Varchar,
        #[max_length = 255]
        email -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    products (id) {
        id -> Int8,
        #[max_length = 255]
        name -> Varchar,
        description -> Text,
        price -> Numeric,
        quantity -> Int4,
        #[max_length = 100]
        category -> Varchar,
        #[max_length = 512]
        image_url -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    carts (id) {
        id -> Uuid,
        customer_id -> Int8,
        #[max_length = 255]
        customer_email -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    cart_lines (id) {
        id -> Uuid,
        cart_id -> Uuid,
        product_id -> Int8,
        #[max_length = 255]
        product_name -> Varchar,
        quantity -> Int4,
        line_total -> Numeric,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    orders (id) {
        id -> Uuid,
        customer_id -> Int8,
        #[max_length = 255]
        customer_email -> Varchar,
        total_amount -> Numeric,
        #[max_length = 20]
        status -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    order_lines (id) {
        id -> Uuid,
        order_id -> Uuid,
        product_id -> Int8,
        #[max_length = 255]
        product_name -> Varchar,
        quantity -> Int4,
        line_total -> Numeric,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(cart_lines -> carts (cart_id));
diesel::joinable!(order_lines -> orders (order_id));

diesel::allow_tables_to_appear_in_same_query!(
    accounts,
    products,
    carts,
    cart_lines,
    orders,
    order_lines,
);
