use maud::{Markup, html};
use rust_decimal::Decimal;
use time::Date;

use crate::{
    category::{Category, CategoryId},
    html::{FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE},
    payment_method::{PaymentMethod, PaymentMethodId},
};

/// The values the expense form fields are prefilled with.
pub(super) struct ExpenseFormDefaults<'a> {
    pub amount: Option<Decimal>,
    pub date: Date,
    pub notes: Option<&'a str>,
    pub category_id: Option<CategoryId>,
    pub payment_method_id: Option<PaymentMethodId>,
    pub max_date: Date,
    pub autofocus_amount: bool,
}

/// The shared fields of the expense create and edit forms.
///
/// The category and payment method selects are only rendered when there is
/// anything to choose from.
pub(super) fn expense_form_fields(
    defaults: &ExpenseFormDefaults<'_>,
    available_categories: &[Category],
    available_payment_methods: &[PaymentMethod],
) -> Markup {
    let amount_str = defaults.amount.map(|amount| amount.to_string());

    html! {
        div
        {
            label
                for="amount"
                class=(FORM_LABEL_STYLE)
            {
                "Amount"
            }

            div class="input-wrapper w-full"
            {
                input
                    name="amount"
                    id="amount"
                    type="number"
                    step="0.001"
                    placeholder="0.000"
                    min="0.001"
                    required
                    value=[amount_str.as_deref()]
                    autofocus[defaults.autofocus_amount]
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }

        div
        {
            label
                for="date"
                class=(FORM_LABEL_STYLE)
            {
                "Date"
            }

            input
                name="date"
                id="date"
                type="date"
                max=(defaults.max_date)
                value=(defaults.date)
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label
                for="notes"
                class=(FORM_LABEL_STYLE)
            {
                "Notes"
            }

            textarea
                name="notes"
                id="notes"
                rows="2"
                placeholder="What was this for?"
                class=(FORM_TEXT_INPUT_STYLE)
            {
                @if let Some(notes) = defaults.notes {
                    (notes)
                }
            }
        }

        @if !available_categories.is_empty() {
            div
            {
                label
                    for="category_id"
                    class=(FORM_LABEL_STYLE)
                {
                    "Category"
                }

                select
                    name="category_id"
                    id="category_id"
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "Select a category" }

                    @for category in available_categories {
                        @if Some(category.id) == defaults.category_id {
                            option value=(category.id) selected { (category.name) }
                        } @else {
                            option value=(category.id) { (category.name) }
                        }
                    }
                }
            }
        }

        @if !available_payment_methods.is_empty() {
            div
            {
                label
                    for="payment_method_id"
                    class=(FORM_LABEL_STYLE)
                {
                    "Payment Method"
                }

                select
                    name="payment_method_id"
                    id="payment_method_id"
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "Select a payment method" }

                    @for payment_method in available_payment_methods {
                        @if Some(payment_method.id) == defaults.payment_method_id {
                            option value=(payment_method.id) selected { (payment_method.name) }
                        } @else {
                            option value=(payment_method.id) { (payment_method.name) }
                        }
                    }
                }
            }
        }
    }
}
